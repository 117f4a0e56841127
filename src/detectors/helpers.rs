//! Common helper functions for gap and swing detection
//!
//! Bar-sequence scanning primitives shared across the detector modules.

use crate::{Direction, OteLevels, Timestamp, OHLCV};

// ============================================================
// OTE RETRACEMENT
// ============================================================

/// Shallow edge of the OTE band: 62% retracement from the swing extreme
pub const OTE_SHALLOW: f64 = 0.62;
/// Deep edge of the OTE band: 79% retracement from the swing extreme
pub const OTE_DEEP: f64 = 0.79;

/// OTE band of a swing, measured back from its extreme.
///
/// Bullish swings retrace down from `high`, bearish swings retrace up from `low`.
/// Levels are clamped into `[low, high]`; requires `low <= high`.
#[inline]
pub fn ote_levels(direction: Direction, high: f64, low: f64) -> OteLevels {
  let range = high - low;
  let (top, bottom) = match direction {
    Direction::Bullish => (high - range * OTE_SHALLOW, high - range * OTE_DEEP),
    Direction::Bearish => (low + range * OTE_DEEP, low + range * OTE_SHALLOW),
  };
  OteLevels { top: top.clamp(low, high), bottom: bottom.clamp(low, high) }
}

// ============================================================
// SCANNING
// ============================================================

/// Index of the last bar reached from `from` while each consecutive pair
/// `(current, next)` satisfies `keep`.
#[inline]
pub fn extend_while<T, F>(bars: &[T], from: usize, mut keep: F) -> usize
where
  F: FnMut(&T, &T) -> bool,
{
  let mut current = from;
  while current + 1 < bars.len() && keep(&bars[current], &bars[current + 1]) {
    current += 1;
  }
  current
}

/// Largest `value` over the bars (`-inf` for an empty slice)
#[inline]
pub fn max_of<T, F: Fn(&T) -> f64>(bars: &[T], value: F) -> f64 {
  bars.iter().map(value).fold(f64::NEG_INFINITY, f64::max)
}

/// Smallest `value` over the bars (`+inf` for an empty slice)
#[inline]
pub fn min_of<T, F: Fn(&T) -> f64>(bars: &[T], value: F) -> f64 {
  bars.iter().map(value).fold(f64::INFINITY, f64::min)
}

/// Sub-sequence whose timestamps fall in the inclusive window `[start, end]`.
///
/// Binary search: timestamps must be strictly increasing.
pub fn time_window<T: OHLCV>(bars: &[T], start: Timestamp, end: Timestamp) -> &[T] {
  let from = bars.partition_point(|b| b.timestamp() < start);
  let to = bars.partition_point(|b| b.timestamp() <= end);
  if from >= to {
    return &[];
  }
  &bars[from..to]
}
