//! ictpd command-line entry point.
//!
//! # Usage
//!
//! ```bash
//! # Extended gaps over one session
//! ictpd --file NQ_1min.csv --from "2025-10-29 09:30" --to "2025-10-29 16:00" gaps
//!
//! # Body swings of at least 4 bars and 20 points
//! ictpd --file NQ_1min.csv --from "2025-10-29 09:30" --to "2025-10-29 16:00" \
//!     runs --variant body --min-length 4 --min-range 20
//!
//! # Gaps inside body swings, scanned in parallel
//! ictpd --file NQ_1min.csv --from "2025-10-29 09:30" --to "2025-10-29 16:00" scoped --parallel
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`). Logs go to stderr, the
//! JSON report to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ictpd::{drawable::drawables, load::load_bars, prelude::*};

#[derive(Parser)]
#[command(name = "ictpd")]
#[command(about = "Fair value gap and swing detection over OHLCV bar files", long_about = None)]
#[command(version)]
struct Cli {
    /// Bar file (DD/MM/YYYY;HH:MM;O;H;L;C;V, no header)
    #[arg(long)]
    file: PathBuf,

    /// First bar to keep (YYYY-MM-DD HH:MM[:SS])
    #[arg(long, value_parser = parse_datetime)]
    from: Timestamp,

    /// Last bar to keep, inclusive (YYYY-MM-DD HH:MM[:SS])
    #[arg(long, value_parser = parse_datetime)]
    to: Timestamp,

    /// JSON scan configuration; command-line parameters override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reject malformed or unordered bars before scanning
    #[arg(long)]
    validate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fair value gaps over the full range
    Gaps {
        #[arg(long, value_enum)]
        variant: Option<GapVariant>,

        /// Minimum gap size in price points
        #[arg(long)]
        min_size: Option<f64>,
    },

    /// Swings over the full range
    Runs {
        #[arg(long, value_enum)]
        variant: Option<RunVariant>,

        /// Minimum number of bars in a swing
        #[arg(long)]
        min_length: Option<usize>,

        /// Minimum swing high-low range in price points
        #[arg(long)]
        min_range: Option<f64>,
    },

    /// Extended gaps found inside body swings
    Scoped {
        /// Minimum gap size in price points
        #[arg(long)]
        min_size: Option<f64>,

        /// Minimum number of bars in a swing
        #[arg(long)]
        min_length: Option<usize>,

        /// Minimum swing high-low range in price points
        #[arg(long)]
        min_range: Option<f64>,

        /// Scan swings in parallel
        #[arg(long)]
        parallel: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GapVariant {
    Strict,
    Extended,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RunVariant {
    Extremum,
    Body,
}

#[derive(Serialize)]
struct Report<'a, P: Serialize> {
    detector: &'static str,
    bars: usize,
    patterns: &'a [P],
    drawables: Vec<Drawable>,
}

impl<'a, P: Serialize + ToDrawables> Report<'a, P> {
    fn new(detector: PatternId, bars: usize, patterns: &'a [P]) -> Self {
        Self {
            detector: detector.as_str(),
            bars,
            patterns,
            drawables: drawables(patterns),
        }
    }
}

fn parse_datetime(s: &str) -> std::result::Result<NaiveDateTime, String> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("invalid date-time '{s}', expected YYYY-MM-DD HH:MM[:SS]"))
}

fn load_config(path: Option<&PathBuf>) -> Result<ScanConfig> {
    let Some(path) = path else {
        return Ok(ScanConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
}

fn gap_detector(
    base: BuiltinGapDetector,
    variant: Option<GapVariant>,
    min_size: Option<f64>,
) -> Result<BuiltinGapDetector> {
    let (current, size) = match base {
        BuiltinGapDetector::Strict(d) => (GapVariant::Strict, d.min_size.get()),
        BuiltinGapDetector::Extended(d) => (GapVariant::Extended, d.min_size.get()),
    };
    let size = min_size.unwrap_or(size);

    Ok(match variant.unwrap_or(current) {
        GapVariant::Strict => BuiltinGapDetector::Strict(StrictGapDetector::new(size)?),
        GapVariant::Extended => BuiltinGapDetector::Extended(ExtendedGapDetector::new(size)?),
    })
}

fn run_detector(
    base: BuiltinRunDetector,
    variant: Option<RunVariant>,
    min_length: Option<usize>,
    min_range: Option<f64>,
) -> Result<BuiltinRunDetector> {
    let (current, length, range) = match base {
        BuiltinRunDetector::Extremum(d) => (RunVariant::Extremum, d.min_length.get(), d.min_range.get()),
        BuiltinRunDetector::Body(d) => (RunVariant::Body, d.min_length.get(), d.min_range.get()),
    };
    let length = min_length.unwrap_or(length);
    let range = min_range.unwrap_or(range);

    Ok(match variant.unwrap_or(current) {
        RunVariant::Extremum => BuiltinRunDetector::Extremum(ExtremumRunDetector::new(length, range)?),
        RunVariant::Body => BuiltinRunDetector::Body(BodyRunDetector::new(length, range)?),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.config.as_ref())?;
    let mut builder = EngineBuilder::from_config(config);
    if cli.validate {
        builder = builder.validate_data(true);
    }

    let bars = load_bars(&cli.file, cli.from, cli.to)
        .with_context(|| format!("Failed to load bars from {}", cli.file.display()))?;

    let json = match cli.command {
        Command::Gaps { variant, min_size } => {
            let engine = builder.gap(gap_detector(config.gap, variant, min_size)?).build();
            let gaps = engine.scan_gaps(&bars)?;
            info!(gaps = gaps.len(), detector = %engine.gap_detector().id(), "gap scan finished");
            serde_json::to_string_pretty(&Report::new(engine.gap_detector().id(), bars.len(), &gaps))
        },
        Command::Runs {
            variant,
            min_length,
            min_range,
        } => {
            let engine = builder
                .run(run_detector(config.run, variant, min_length, min_range)?)
                .build();
            let runs = engine.scan_runs(&bars)?;
            info!(runs = runs.len(), detector = %engine.run_detector().id(), "swing scan finished");
            serde_json::to_string_pretty(&Report::new(engine.run_detector().id(), bars.len(), &runs))
        },
        Command::Scoped {
            min_size,
            min_length,
            min_range,
            parallel,
        } => {
            let base = config.scoped;
            let runs = BodyRunDetector::new(
                min_length.unwrap_or(base.runs.min_length.get()),
                min_range.unwrap_or(base.runs.min_range.get()),
            )?;
            let gaps = ExtendedGapDetector::new(min_size.unwrap_or(base.gaps.min_size.get()))?;
            let composer = ScopedComposer::new(runs, gaps).parallel(base.parallel || parallel);

            let engine = builder.scoped(composer).build();
            let grouped = engine.scan_scoped_grouped(&bars)?;
            info!(
                runs = grouped.len(),
                gaps = grouped.iter().map(|s| s.gaps.len()).sum::<usize>(),
                "scoped scan finished"
            );
            serde_json::to_string_pretty(&Report::new(PatternId("SCOPED"), bars.len(), &grouped))
        },
    }
    .context("Failed to serialize report")?;

    println!("{json}");
    Ok(())
}
