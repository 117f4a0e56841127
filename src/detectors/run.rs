//! Swing (directional run) detectors
//!
//! Unlike the gap rules, swing rules consume bars: once a run closes the scan
//! resumes after it. Body runs never share a bar; an extremum reversal run
//! starts on the closing bar of the run before it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::helpers::{extend_while, max_of, min_of, ote_levels};
use crate::{
  params::{get_period, get_threshold, ParamMeta, ParameterizedDetector},
  Direction, OHLCVExt, Period, PatternId, Result, Run, RunDetector, RunSpan, Threshold, OHLCV,
};

impl_with_defaults!(ExtremumRunDetector, BodyRunDetector);

// ============================================================
// EXTREMUM (wick) SWINGS
// ============================================================

/// Swing - consecutive bars with non-decreasing lows (bullish) or
/// non-increasing highs (bearish)
///
/// A bullish run starts at `i-1` when `low[i] > low[i-1]` and continues while the
/// next low is >= the current one; plateaus are tolerated. A bearish run starts
/// when `high[i] < high[i-1]` and mirrors this on highs. The run's price extent
/// is the highest high and lowest low over its bars.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremumRunDetector {
  /// Minimum number of bars in the run
  pub min_length: Period,
  /// Minimum `high - low` of the run in price points
  pub min_range: Threshold,
}

impl Default for ExtremumRunDetector {
  fn default() -> Self {
    Self { min_length: Period::new_const(3), min_range: Threshold::ZERO }
  }
}

impl ExtremumRunDetector {
  pub fn new(min_length: usize, min_range: f64) -> Result<Self> {
    Ok(Self { min_length: Period::new(min_length)?, min_range: Threshold::new(min_range)? })
  }
}

impl RunDetector for ExtremumRunDetector {
  fn id(&self) -> PatternId {
    PatternId("SWING_EXTREMUM")
  }

  fn min_bars(&self) -> usize {
    self.min_length.get().max(2)
  }

  fn scan<T: OHLCV>(&self, bars: &[T]) -> Vec<Run> {
    let len = bars.len();
    if len < self.min_bars() {
      return Vec::new();
    }

    let mut runs = Vec::new();
    let mut i = 1;
    while i < len {
      let (direction, end) = if bars[i].low() > bars[i - 1].low() {
        (Direction::Bullish, extend_while(bars, i, |cur, next| next.low() >= cur.low()))
      } else if bars[i].high() < bars[i - 1].high() {
        (Direction::Bearish, extend_while(bars, i, |cur, next| next.high() <= cur.high()))
      } else {
        i += 1;
        continue;
      };

      let start = i - 1;
      let span = &bars[start..=end];
      let high = max_of(span, |b| b.high());
      let low = min_of(span, |b| b.low());

      if span.len() >= self.min_length.get() && high - low >= self.min_range.get() {
        runs.push(Run::new(
          direction,
          RunSpan { start: span[0].timestamp(), end: bars[end].timestamp(), high, low, ote: None },
        ));
      }

      // `bars[end]` is compared with the next bar, so a reversal shares it
      i = end + 1;
    }

    tracing::debug!(detector = %self.id(), bars = len, runs = runs.len(), "swing scan complete");
    runs
  }
}

// ============================================================
// BODY SWINGS (with OTE)
// ============================================================

/// Swing - maximal sequence of same-direction candle bodies, with OTE levels
///
/// Bullish runs span `[min(open), max(close)]`, bearish runs span
/// `[min(close), max(open)]`. The span is stretched by body imbalances at its
/// edges: a preceding opposite-direction bar that closed beyond the run's first
/// open, and a following bar that opened beyond the run's last close. Neutral
/// bars (close == open) end a run and are skipped on their own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyRunDetector {
  /// Minimum number of consecutive same-direction bars
  pub min_length: Period,
  /// Minimum `high - low` of the run in price points, after edge extension
  pub min_range: Threshold,
}

impl Default for BodyRunDetector {
  fn default() -> Self {
    Self { min_length: Period::new_const(3), min_range: Threshold::ZERO }
  }
}

impl BodyRunDetector {
  pub fn new(min_length: usize, min_range: f64) -> Result<Self> {
    Ok(Self { min_length: Period::new(min_length)?, min_range: Threshold::new(min_range)? })
  }

  /// Body extent of `bars[start..=end]`, stretched by imbalances at either edge.
  fn body_extent<T: OHLCV>(bars: &[T], start: usize, end: usize, direction: Direction) -> (f64, f64) {
    let span = &bars[start..=end];
    let first = &bars[start];
    let last = &bars[end];
    let before = start.checked_sub(1).map(|k| &bars[k]);
    let after = bars.get(end + 1);

    match direction {
      Direction::Bullish => {
        let mut high = max_of(span, |b| b.close());
        let mut low = min_of(span, |b| b.open());
        if let Some(prev) = before.filter(|b| b.is_bearish() && b.close() < first.open()) {
          low = low.min(prev.close());
        }
        if let Some(next) = after.filter(|b| b.open() > last.close()) {
          high = high.max(next.open());
        }
        (high, low)
      },
      Direction::Bearish => {
        let mut high = max_of(span, |b| b.open());
        let mut low = min_of(span, |b| b.close());
        if let Some(prev) = before.filter(|b| b.is_bullish() && b.close() > first.open()) {
          high = high.max(prev.close());
        }
        if let Some(next) = after.filter(|b| b.open() < last.close()) {
          low = low.min(next.open());
        }
        (high, low)
      },
    }
  }
}

impl RunDetector for BodyRunDetector {
  fn id(&self) -> PatternId {
    PatternId("SWING_BODY")
  }

  fn min_bars(&self) -> usize {
    self.min_length.get()
  }

  fn scan<T: OHLCV>(&self, bars: &[T]) -> Vec<Run> {
    let len = bars.len();
    if len < self.min_bars() {
      return Vec::new();
    }

    let mut runs = Vec::new();
    let mut i = 0;
    while i < len {
      let Some(direction) = bars[i].body_direction() else {
        i += 1;
        continue;
      };

      let start = i;
      let end = extend_while(bars, start, |_, next| next.body_direction() == Some(direction));

      if end - start + 1 >= self.min_length.get() {
        let (high, low) = Self::body_extent(bars, start, end, direction);
        if high - low >= self.min_range.get() {
          runs.push(Run::new(
            direction,
            RunSpan {
              start: bars[start].timestamp(),
              end: bars[end].timestamp(),
              high,
              low,
              ote: Some(ote_levels(direction, high, low)),
            },
          ));
        }
      }

      i = end + 1;
    }

    tracing::debug!(detector = %self.id(), bars = len, runs = runs.len(), "swing scan complete");
    runs
  }
}

// ============================================================
// PARAMETERS
// ============================================================

static RUN_PARAMS: &[ParamMeta] = &[
  ParamMeta::period("min_length", 3.0, (2.0, 8.0, 1.0), "Minimum number of bars in a swing"),
  ParamMeta::threshold("min_range", 0.0, (0.0, 50.0, 5.0), "Minimum swing high-low range in price points"),
];

impl ParameterizedDetector for ExtremumRunDetector {
  fn param_meta() -> &'static [ParamMeta] {
    RUN_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self {
      min_length: get_period(params, "min_length", 3)?,
      min_range: get_threshold(params, "min_range", 0.0)?,
    })
  }

  fn pattern_id_str() -> &'static str {
    "SWING_EXTREMUM"
  }
}

impl ParameterizedDetector for BodyRunDetector {
  fn param_meta() -> &'static [ParamMeta] {
    RUN_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self {
      min_length: get_period(params, "min_length", 3)?,
      min_range: get_threshold(params, "min_range", 0.0)?,
    })
  }

  fn pattern_id_str() -> &'static str {
    "SWING_BODY"
  }
}
