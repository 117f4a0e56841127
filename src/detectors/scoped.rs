//! Swing-scoped gap scanning
//!
//! Body swings are detected over the full sequence, then the extended gap rule
//! is re-run on each swing's own bars. A gap whose 3-bar window leaves the swing
//! is invisible to that swing's scan.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{helpers::time_window, BodyRunDetector, ExtendedGapDetector};
use crate::{Gap, GapDetector, Run, RunDetector, OHLCV};

/// A swing together with the gaps found inside its `[start, end]` window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedRun {
  pub run: Run,
  /// Ascending timestamp order
  pub gaps: Vec<Gap>,
}

/// Body swings gating a nested extended gap scan
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopedComposer {
  pub runs: BodyRunDetector,
  pub gaps: ExtendedGapDetector,
  /// Scan swings on the rayon pool; output order is unchanged
  pub parallel: bool,
}

impl ScopedComposer {
  pub fn new(runs: BodyRunDetector, gaps: ExtendedGapDetector) -> Self {
    Self { runs, gaps, parallel: false }
  }

  pub fn parallel(mut self, enable: bool) -> Self {
    self.parallel = enable;
    self
  }

  /// Swings in detection order, each with its own gaps.
  pub fn scan_grouped<T: OHLCV + Sync>(&self, bars: &[T]) -> Vec<ScopedRun> {
    let runs = self.runs.scan(bars);

    let scan_run = |run: Run| {
      let window = time_window(bars, run.start(), run.end());
      ScopedRun { run, gaps: self.gaps.scan(window) }
    };

    let grouped: Vec<ScopedRun> = if self.parallel {
      runs.into_par_iter().map(scan_run).collect()
    } else {
      runs.into_iter().map(scan_run).collect()
    };

    tracing::debug!(
      runs = grouped.len(),
      gaps = grouped.iter().map(|s| s.gaps.len()).sum::<usize>(),
      parallel = self.parallel,
      "scoped scan complete"
    );
    grouped
  }

  /// Concatenation of the per-swing gap lists, in swing order.
  pub fn scan<T: OHLCV + Sync>(&self, bars: &[T]) -> Vec<Gap> {
    self.scan_grouped(bars).into_iter().flat_map(|scoped| scoped.gaps).collect()
  }
}
