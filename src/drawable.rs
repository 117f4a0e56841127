//! Line geometry for detected patterns
//!
//! Converts gaps and swings into plain line segments for an external charting
//! tool. Nothing here draws; a [`Drawable`] is just coordinates plus styling.

use chrono::Duration;
use serde::Serialize;

use crate::{detectors::ScopedRun, Gap, Run, Timestamp};

/// How far a gap's lines extend to the right of its anchor bar
pub const GAP_EXTENT_MINUTES: i64 = 5;
/// Line width of gap boundaries
pub const GAP_LINE_WIDTH: f64 = 3.5;

/// Named line color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Color(pub &'static str);

impl Color {
    pub const ROYAL_BLUE: Color = Color("royalblue");
    pub const GREEN: Color = Color("green");
    pub const RED: Color = Color("red");
    /// OTE levels
    pub const ACCENT: Color = Color("darkorange");
}

impl Default for Color {
    fn default() -> Self {
        Self::ROYAL_BLUE
    }
}

/// Line dash pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LineStyle {
    #[default]
    #[serde(rename = "-")]
    Solid,
    #[serde(rename = "--")]
    Dashed,
    #[serde(rename = ":")]
    Dotted,
    #[serde(rename = "-.")]
    DashDot,
}

/// A single styled line segment in (time, price) space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Drawable {
    pub start_time: Timestamp,
    pub start_price: f64,
    pub end_time: Timestamp,
    pub end_price: f64,
    pub color: Color,
    pub style: LineStyle,
    pub width: f64,
}

impl Drawable {
    /// Horizontal segment at `price` (default width 3.0)
    pub fn horizontal_line(start_time: Timestamp, end_time: Timestamp, price: f64) -> Self {
        Self {
            start_time,
            start_price: price,
            end_time,
            end_price: price,
            color: Color::default(),
            style: LineStyle::Solid,
            width: 3.0,
        }
    }

    /// Vertical segment at `time` (default width 1.6)
    pub fn vertical_line(time: Timestamp, low_price: f64, high_price: f64) -> Self {
        Self {
            start_time: time,
            start_price: low_price,
            end_time: time,
            end_price: high_price,
            color: Color::default(),
            style: LineStyle::Solid,
            width: 1.6,
        }
    }

    /// Box outline: top, bottom, left and right edges, in that order (width 1.6)
    pub fn rectangle(start_time: Timestamp, end_time: Timestamp, top: f64, bottom: f64) -> [Self; 4] {
        [
            Self::horizontal_line(start_time, end_time, top).with_width(1.6),
            Self::horizontal_line(start_time, end_time, bottom).with_width(1.6),
            Self::vertical_line(start_time, bottom, top),
            Self::vertical_line(end_time, bottom, top),
        ]
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }
}

/// Conversion of a detected pattern into line segments
pub trait ToDrawables {
    fn to_drawables(&self) -> Vec<Drawable>;
}

impl ToDrawables for Gap {
    /// Two horizontal lines at the gap bounds, `GAP_EXTENT_MINUTES` wide
    fn to_drawables(&self) -> Vec<Drawable> {
        let color = match self {
            Gap::Bullish(_) => Color::GREEN,
            Gap::Bearish(_) => Color::RED,
        };
        let start = self.start();
        let end = start + Duration::minutes(GAP_EXTENT_MINUTES);

        [self.low(), self.high()]
            .into_iter()
            .map(|price| {
                Drawable::horizontal_line(start, end, price)
                    .with_color(color)
                    .with_width(GAP_LINE_WIDTH)
            })
            .collect()
    }
}

impl ToDrawables for Run {
    /// Rectangle over the swing, plus dotted OTE lines when present
    fn to_drawables(&self) -> Vec<Drawable> {
        let color = match self {
            Run::Bullish(_) => Color::GREEN,
            Run::Bearish(_) => Color::RED,
        };
        let mut lines: Vec<Drawable> = Drawable::rectangle(self.start(), self.end(), self.high(), self.low())
            .into_iter()
            .map(|line| line.with_color(color))
            .collect();

        if let Some(ote) = self.ote() {
            for price in [ote.top, ote.bottom] {
                lines.push(
                    Drawable::horizontal_line(self.start(), self.end(), price)
                        .with_color(Color::ACCENT)
                        .with_style(LineStyle::Dotted)
                        .with_width(1.6),
                );
            }
        }
        lines
    }
}

impl ToDrawables for ScopedRun {
    fn to_drawables(&self) -> Vec<Drawable> {
        let mut lines = self.run.to_drawables();
        lines.extend(drawables(&self.gaps));
        lines
    }
}

/// Flatten the drawables of a list of patterns
pub fn drawables<P: ToDrawables>(patterns: &[P]) -> Vec<Drawable> {
    patterns.iter().flat_map(ToDrawables::to_drawables).collect()
}
