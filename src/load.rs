//! Bar file ingestion
//!
//! Bar files hold one bar per line, semicolon-separated, without a header:
//!
//! ```text
//! 29/10/2025;09:30;25912.25;25920.50;25901.00;25915.75;1834
//! ```
//!
//! Fields are `DD/MM/YYYY;HH:MM;Open;High;Low;Close;Volume`.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::{Bar, Timestamp};

/// `chrono` format of the joined date and time columns
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Errors raised while reading a bar file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Parse a single bar line.
pub fn parse_line(line: &str) -> Result<Bar, String> {
    let fields: Vec<&str> = line.trim().split(';').map(str::trim).collect();
    let [date, time, open, high, low, close, volume] = fields[..] else {
        return Err(format!("expected 7 fields, got {}", fields.len()));
    };

    let timestamp = NaiveDateTime::parse_from_str(&format!("{date} {time}"), TIMESTAMP_FORMAT)
        .map_err(|e| format!("invalid timestamp '{date} {time}': {e}"))?;
    let price = |name: &str, raw: &str| {
        raw.parse::<f64>()
            .map_err(|e| format!("invalid {name} '{raw}': {e}"))
    };
    let volume = volume
        .parse::<u64>()
        .map_err(|e| format!("invalid volume '{volume}': {e}"))?;

    Ok(Bar::new(
        timestamp,
        price("open", open)?,
        price("high", high)?,
        price("low", low)?,
        price("close", close)?,
        volume,
    ))
}

/// Parse every non-blank line of a bar file.
pub fn parse_bars<R: BufRead>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut bars = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: PathBuf::new(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let bar = parse_line(&line).map_err(|reason| LoadError::Parse { line: i + 1, reason })?;
        bars.push(bar);
    }
    Ok(bars)
}

/// Keep the bars in the inclusive range `[first, last]`.
pub fn filter_range(bars: Vec<Bar>, first: Timestamp, last: Timestamp) -> Vec<Bar> {
    bars.into_iter()
        .filter(|b| b.timestamp >= first && b.timestamp <= last)
        .collect()
}

/// Load the bars of `path` whose timestamp lies in `[first, last]`.
pub fn load_bars(path: impl AsRef<Path>, first: Timestamp, last: Timestamp) -> Result<Vec<Bar>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let bars = parse_bars(BufReader::new(file)).map_err(|e| match e {
        LoadError::Io { source, .. } => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    let bars = filter_range(bars, first, last);

    if bars.is_empty() {
        warn!(path = %path.display(), %first, %last, "no bars in range");
    } else {
        info!(path = %path.display(), bars = bars.len(), %first, %last, "loaded bars");
    }
    Ok(bars)
}
