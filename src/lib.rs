//! # ICTPD - price-action pattern detector
//!
//! Detects fair value gaps ("FVG") and directional swings in a time-ordered bar
//! sequence, with optional OTE retracement levels and swing-scoped gap scans.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, NaiveDate};
//! use ictpd::prelude::*;
//!
//! let t0 = NaiveDate::from_ymd_opt(2025, 10, 29)
//!     .unwrap()
//!     .and_hms_opt(9, 30, 0)
//!     .unwrap();
//! let minute = Duration::minutes(1);
//!
//! let bars = vec![
//!     Bar::new(t0, 100.0, 102.0, 99.0, 101.0, 1200),
//!     Bar::new(t0 + minute, 101.0, 103.0, 100.0, 102.0, 900),
//!     Bar::new(t0 + minute * 2, 104.0, 106.0, 103.0, 105.0, 1500),
//! ];
//!
//! let engine = EngineBuilder::new()
//!     .gap(BuiltinGapDetector::Strict(StrictGapDetector::with_defaults()))
//!     .build();
//!
//! let gaps = engine.scan_gaps(&bars).unwrap();
//! assert_eq!(gaps.len(), 1);
//! assert_eq!((gaps[0].low(), gaps[0].high()), (102.0, 103.0));
//! ```

use serde::{Deserialize, Serialize};

pub mod detectors;
pub mod drawable;
pub mod load;
pub mod params;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::*,
        // Geometry
        drawable::{Color, Drawable, LineStyle, ToDrawables},
        // Parameters
        params::{get_period, get_threshold, ParamMeta, ParamType, ParameterizedDetector},
        // Types
        Bar,
        // Engine
        BuiltinGapDetector,
        BuiltinRunDetector,
        Direction,
        EngineBuilder,
        EngineConfig,
        Gap,
        // Core traits
        GapDetector,
        GapZone,
        OHLCVExt,
        OteLevels,
        PatternEngine,
        // Errors
        PatternError,
        PatternId,
        Period,
        Result,
        Run,
        RunDetector,
        RunSpan,
        ScanConfig,
        Threshold,
        Timestamp,
        OHLCV,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors that can occur during pattern detection
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Non-negative, finite price distance (minimum gap size, minimum swing range)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    pub const ZERO: Self = Self(0.0);

    /// Create a new Threshold, validating the value is finite and >= 0.0
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Threshold cannot be NaN or infinite",
            ));
        }
        if value < 0.0 {
            return Err(PatternError::OutOfRange {
                field: "Threshold",
                value,
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(Self(value))
    }

    /// Create a Threshold from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Serialize for Threshold {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Threshold::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period in bars (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Wall-clock bar timestamp, as written in the bar files (no timezone)
pub type Timestamp = chrono::NaiveDateTime;

/// Core OHLCV data trait
pub trait OHLCV {
    fn timestamp(&self) -> Timestamp;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> u64;
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body direction; `None` for a neutral bar (close == open)
    #[inline]
    fn body_direction(&self) -> Option<Direction> {
        if self.is_bullish() {
            Some(Direction::Bullish)
        } else if self.is_bearish() {
            Some(Direction::Bearish)
        } else {
            None
        }
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "high < low",
            });
        }
        if self.high() < self.open().max(self.close()) || self.low() > self.open().min(self.close())
        {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "body outside high/low",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// A single fixed-interval bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(timestamp: Timestamp, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Bar {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> u64 {
        self.volume
    }
}

// ============================================================
// PATTERNS - value objects, never mutated after detection
// ============================================================

/// Unique identifier for a detector rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Direction of a pattern ("Bisi"/"Sibi" for gaps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Price bounds of a gap, anchored at the first bar of its 3-bar window.
///
/// Invariant: `low < high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapZone {
    pub start: Timestamp,
    pub low: f64,
    pub high: f64,
}

impl GapZone {
    #[inline]
    pub fn size(&self) -> f64 {
        self.high - self.low
    }
}

/// Fair value gap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gap {
    /// Price jumped up, leaving a gap below ("Bisi")
    Bullish(GapZone),
    /// Price dropped, leaving a gap above ("Sibi")
    Bearish(GapZone),
}

impl Gap {
    pub fn new(direction: Direction, zone: GapZone) -> Self {
        match direction {
            Direction::Bullish => Gap::Bullish(zone),
            Direction::Bearish => Gap::Bearish(zone),
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        match self {
            Gap::Bullish(_) => Direction::Bullish,
            Gap::Bearish(_) => Direction::Bearish,
        }
    }

    #[inline]
    pub fn zone(&self) -> &GapZone {
        match self {
            Gap::Bullish(zone) | Gap::Bearish(zone) => zone,
        }
    }

    #[inline]
    pub fn start(&self) -> Timestamp {
        self.zone().start
    }

    #[inline]
    pub fn low(&self) -> f64 {
        self.zone().low
    }

    #[inline]
    pub fn high(&self) -> f64 {
        self.zone().high
    }

    #[inline]
    pub fn size(&self) -> f64 {
        self.zone().size()
    }
}

/// OTE retracement band. Invariant: `low <= bottom <= top <= high` of its swing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OteLevels {
    pub top: f64,
    pub bottom: f64,
}

/// Time and price extent of a swing.
///
/// Invariants: `start <= end`, `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSpan {
    pub start: Timestamp,
    pub end: Timestamp,
    pub high: f64,
    pub low: f64,
    /// Only set by detectors that compute retracement levels
    pub ote: Option<OteLevels>,
}

impl RunSpan {
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// True if `ts` lies in the inclusive window `[start, end]`
    #[inline]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Directional swing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Run {
    Bullish(RunSpan),
    Bearish(RunSpan),
}

impl Run {
    pub fn new(direction: Direction, span: RunSpan) -> Self {
        match direction {
            Direction::Bullish => Run::Bullish(span),
            Direction::Bearish => Run::Bearish(span),
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        match self {
            Run::Bullish(_) => Direction::Bullish,
            Run::Bearish(_) => Direction::Bearish,
        }
    }

    #[inline]
    pub fn span(&self) -> &RunSpan {
        match self {
            Run::Bullish(span) | Run::Bearish(span) => span,
        }
    }

    #[inline]
    pub fn start(&self) -> Timestamp {
        self.span().start
    }

    #[inline]
    pub fn end(&self) -> Timestamp {
        self.span().end
    }

    #[inline]
    pub fn high(&self) -> f64 {
        self.span().high
    }

    #[inline]
    pub fn low(&self) -> f64 {
        self.span().low
    }

    #[inline]
    pub fn ote(&self) -> Option<OteLevels> {
        self.span().ote
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.span().range()
    }
}

// ============================================================
// DETECTOR TRAITS
// ============================================================

/// Gap rule evaluated independently on every 3-bar window.
///
/// Windows overlap: the scan advances one bar at a time even after a match.
pub trait GapDetector: Send + Sync {
    fn id(&self) -> PatternId;

    fn min_bars(&self) -> usize {
        3
    }

    /// Detect a gap in the window ending at `index`
    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<Gap>;

    /// Scan all windows; output is in ascending timestamp order
    fn scan<T: OHLCV>(&self, bars: &[T]) -> Vec<Gap> {
        if bars.len() < self.min_bars() {
            return Vec::new();
        }

        let gaps: Vec<Gap> = (self.min_bars() - 1..bars.len())
            .filter_map(|i| self.detect(bars, i))
            .collect();

        tracing::debug!(
            detector = %self.id(),
            bars = bars.len(),
            gaps = gaps.len(),
            "gap scan complete"
        );
        gaps
    }
}

/// Swing rule. Runs consume their bars and are emitted in ascending order; at
/// most the boundary bar between two consecutive runs is shared.
pub trait RunDetector: Send + Sync {
    fn id(&self) -> PatternId;

    /// Shortest sequence that can produce a run
    fn min_bars(&self) -> usize;

    fn scan<T: OHLCV>(&self, bars: &[T]) -> Vec<Run>;
}

// ============================================================
// BUILTIN DETECTORS - enum dispatch over the rule variants
// ============================================================

use detectors::*;

/// Gap rule variants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum BuiltinGapDetector {
    Strict(StrictGapDetector),
    Extended(ExtendedGapDetector),
}

impl Default for BuiltinGapDetector {
    fn default() -> Self {
        Self::Extended(ExtendedGapDetector::default())
    }
}

impl BuiltinGapDetector {
    #[inline]
    pub fn id(&self) -> PatternId {
        match self {
            Self::Strict(d) => GapDetector::id(d),
            Self::Extended(d) => GapDetector::id(d),
        }
    }

    #[inline]
    pub fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<Gap> {
        match self {
            Self::Strict(d) => d.detect(bars, index),
            Self::Extended(d) => d.detect(bars, index),
        }
    }

    pub fn scan<T: OHLCV>(&self, bars: &[T]) -> Vec<Gap> {
        match self {
            Self::Strict(d) => d.scan(bars),
            Self::Extended(d) => d.scan(bars),
        }
    }
}

/// Swing rule variants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum BuiltinRunDetector {
    Extremum(ExtremumRunDetector),
    Body(BodyRunDetector),
}

impl Default for BuiltinRunDetector {
    fn default() -> Self {
        Self::Body(BodyRunDetector::default())
    }
}

impl BuiltinRunDetector {
    #[inline]
    pub fn id(&self) -> PatternId {
        match self {
            Self::Extremum(d) => RunDetector::id(d),
            Self::Body(d) => RunDetector::id(d),
        }
    }

    pub fn scan<T: OHLCV>(&self, bars: &[T]) -> Vec<Run> {
        match self {
            Self::Extremum(d) => d.scan(bars),
            Self::Body(d) => d.scan(bars),
        }
    }
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reject malformed bars (NaN, high < low, unordered timestamps) before scanning
    pub validate_data: bool,
}

/// Complete, serde-loadable scan configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub gap: BuiltinGapDetector,
    pub run: BuiltinRunDetector,
    pub scoped: ScopedComposer,
    pub engine: EngineConfig,
}

/// Main pattern detection engine
#[derive(Debug, Clone)]
pub struct PatternEngine {
    gap: BuiltinGapDetector,
    run: BuiltinRunDetector,
    scoped: ScopedComposer,
    config: EngineConfig,
}

impl PatternEngine {
    pub fn gap_detector(&self) -> &BuiltinGapDetector {
        &self.gap
    }

    pub fn run_detector(&self) -> &BuiltinRunDetector {
        &self.run
    }

    pub fn composer(&self) -> &ScopedComposer {
        &self.scoped
    }

    /// Scan the full sequence for gaps with the configured gap rule.
    pub fn scan_gaps<T: OHLCV>(&self, bars: &[T]) -> Result<Vec<Gap>> {
        self.check(bars)?;
        Ok(self.gap.scan(bars))
    }

    /// Scan the full sequence for swings with the configured run rule.
    pub fn scan_runs<T: OHLCV>(&self, bars: &[T]) -> Result<Vec<Run>> {
        self.check(bars)?;
        Ok(self.run.scan(bars))
    }

    /// Gaps found inside each body swing, concatenated in swing order.
    pub fn scan_scoped<T: OHLCV + Sync>(&self, bars: &[T]) -> Result<Vec<Gap>> {
        self.check(bars)?;
        Ok(self.scoped.scan(bars))
    }

    /// Body swings paired with the gaps found inside each of them.
    pub fn scan_scoped_grouped<T: OHLCV + Sync>(&self, bars: &[T]) -> Result<Vec<ScopedRun>> {
        self.check(bars)?;
        Ok(self.scoped.scan_grouped(bars))
    }

    fn check<T: OHLCV>(&self, bars: &[T]) -> Result<()> {
        if self.config.validate_data {
            validate_bars(bars)?;
        }
        Ok(())
    }
}

/// Check every bar and the strict ordering of timestamps
pub fn validate_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            PatternError::InvalidOHLCV { reason, .. } => PatternError::InvalidOHLCV { index: i, reason },
            other => other,
        })?;
    }
    if let Some(i) = bars
        .windows(2)
        .position(|pair| pair[1].timestamp() <= pair[0].timestamp())
    {
        return Err(PatternError::InvalidOHLCV {
            index: i + 1,
            reason: "timestamp not strictly increasing",
        });
    }
    Ok(())
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    gap: BuiltinGapDetector,
    run: BuiltinRunDetector,
    scoped: ScopedComposer,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a deserialized configuration
    pub fn from_config(config: ScanConfig) -> Self {
        Self {
            gap: config.gap,
            run: config.run,
            scoped: config.scoped,
            config: config.engine,
        }
    }

    /// Set the gap rule used by `scan_gaps`
    pub fn gap(mut self, detector: BuiltinGapDetector) -> Self {
        self.gap = detector;
        self
    }

    /// Set the swing rule used by `scan_runs`
    pub fn run(mut self, detector: BuiltinRunDetector) -> Self {
        self.run = detector;
        self
    }

    /// Set the composer used by `scan_scoped`
    pub fn scoped(mut self, composer: ScopedComposer) -> Self {
        self.scoped = composer;
        self
    }

    /// Run the composer's per-swing gap scans on the rayon pool
    pub fn parallel(mut self, enable: bool) -> Self {
        self.scoped.parallel = enable;
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the engine
    pub fn build(self) -> PatternEngine {
        PatternEngine {
            gap: self.gap,
            run: self.run,
            scoped: self.scoped,
            config: self.config,
        }
    }
}

// ============================================================
// TESTS
// ============================================================
