//! Price-action pattern detectors
//!
//! # Rule Variants
//!
//! - **Gaps (FVG)**: strict wick-to-wick rule, extended rule with body imbalances
//! - **Swings**: wick-extremum rule, candle-body rule with OTE retracement levels
//! - **Scoped**: body swings gating a nested extended gap scan

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod gap;
pub mod run;
pub mod scoped;

// Re-export all detectors for convenience
pub use gap::*;
pub use helpers::*;
pub use run::*;
pub use scoped::*;
