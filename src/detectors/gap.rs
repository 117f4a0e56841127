//! Fair value gap detectors
//!
//! Both rules look at the 3-bar window `(i-2, i-1, i)` and fire when the wick of
//! the first bar and the opposite wick of the third bar do not overlap. The gap is
//! anchored at the first bar of the window. Windows slide one bar at a time, so
//! consecutive gaps may share bars.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  params::{get_threshold, ParamMeta, ParameterizedDetector},
  Direction, Gap, GapDetector, GapZone, PatternId, Result, Threshold, Timestamp, OHLCV,
};

impl_with_defaults!(StrictGapDetector, ExtendedGapDetector);

/// Wick gap between the first and third bar of a window: `(direction, low, high)`.
#[inline]
fn wick_gap<T: OHLCV>(first: &T, third: &T) -> Option<(Direction, f64, f64)> {
  if third.low() > first.high() {
    Some((Direction::Bullish, first.high(), third.low()))
  } else if third.high() < first.low() {
    Some((Direction::Bearish, third.high(), first.low()))
  } else {
    None
  }
}

#[inline]
fn emit(direction: Direction, start: Timestamp, low: f64, high: f64, min_size: Threshold) -> Option<Gap> {
  (high - low >= min_size.get()).then(|| Gap::new(direction, GapZone { start, low, high }))
}

// ============================================================
// STRICT
// ============================================================

/// FVG - strict wick-to-wick rule
///
/// Bullish: `low[i] > high[i-2]`, bounds `(high[i-2], low[i])`.
/// Bearish: `high[i] < low[i-2]`, bounds `(high[i], low[i-2])`.
/// The middle bar is not inspected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StrictGapDetector {
  /// Minimum gap size in price points
  pub min_size: Threshold,
}

impl Default for StrictGapDetector {
  fn default() -> Self {
    Self { min_size: Threshold::ZERO }
  }
}

impl StrictGapDetector {
  pub fn new(min_size: f64) -> Result<Self> {
    Ok(Self { min_size: Threshold::new(min_size)? })
  }
}

impl GapDetector for StrictGapDetector {
  fn id(&self) -> PatternId {
    PatternId("FVG_STRICT")
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<Gap> {
    if index < 2 {
      return None;
    }
    let first = bars.get(index - 2)?;
    let third = bars.get(index)?;

    let (direction, low, high) = wick_gap(first, third)?;
    emit(direction, first.timestamp(), low, high, self.min_size)
  }
}

// ============================================================
// EXTENDED (volume imbalance)
// ============================================================

/// FVG - wick gap widened by body imbalances around the middle bar
///
/// Same trigger as [`StrictGapDetector`]. A bullish gap extends down to
/// `close[i-2]` when it sits below `open[i-1]`, and up to `open[i]` when it sits
/// above `close[i-1]`; bearish gaps mirror this. Size filtering uses the widened
/// bounds, which always contain the strict ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedGapDetector {
  /// Minimum gap size in price points, measured on the widened bounds
  pub min_size: Threshold,
}

impl Default for ExtendedGapDetector {
  fn default() -> Self {
    Self { min_size: Threshold::ZERO }
  }
}

impl ExtendedGapDetector {
  pub fn new(min_size: f64) -> Result<Self> {
    Ok(Self { min_size: Threshold::new(min_size)? })
  }
}

impl GapDetector for ExtendedGapDetector {
  fn id(&self) -> PatternId {
    PatternId("FVG_EXTENDED")
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<Gap> {
    if index < 2 {
      return None;
    }
    let first = bars.get(index - 2)?;
    let middle = bars.get(index - 1)?;
    let third = bars.get(index)?;

    let (direction, mut low, mut high) = wick_gap(first, third)?;
    match direction {
      Direction::Bullish => {
        if first.close() < middle.open() {
          low = first.close();
        }
        if third.open() > middle.close() {
          high = third.open();
        }
      },
      Direction::Bearish => {
        if first.close() > middle.open() {
          high = first.close();
        }
        if third.open() < middle.close() {
          low = third.open();
        }
      },
    }

    emit(direction, first.timestamp(), low, high, self.min_size)
  }
}

// ============================================================
// PARAMETERS
// ============================================================

static GAP_PARAMS: &[ParamMeta] =
  &[ParamMeta::threshold("min_size", 0.0, (0.0, 20.0, 1.0), "Minimum gap size in price points")];

impl ParameterizedDetector for StrictGapDetector {
  fn param_meta() -> &'static [ParamMeta] {
    GAP_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self { min_size: get_threshold(params, "min_size", 0.0)? })
  }

  fn pattern_id_str() -> &'static str {
    "FVG_STRICT"
  }
}

impl ParameterizedDetector for ExtendedGapDetector {
  fn param_meta() -> &'static [ParamMeta] {
    GAP_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self { min_size: get_threshold(params, "min_size", 0.0)? })
  }

  fn pattern_id_str() -> &'static str {
    "FVG_EXTENDED"
  }
}
