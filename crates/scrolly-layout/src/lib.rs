#![forbid(unsafe_code)]

//! Layout primitives and label placement.
//!
//! - [`sizing`] - responsive chart dimensions and inner plot area
//! - [`Flex`] - 1D split of a region into cells with a fixed gap
//! - [`composite`] - dual / triple / grid compositions built on [`Flex`]
//! - [`labels`] - non-overlapping end-of-line labels for multi-series charts
//! - [`scale`], [`measure`] - the scale and text-measurement seams the label
//!   engine needs from the drawing surface
//!
//! Everything is a pure function of its inputs; nothing here caches between
//! calls.

pub mod composite;
pub mod labels;
pub mod measure;
pub mod scale;
pub mod sizing;

pub use composite::{Arrangement, CompositeLayout, LayoutKind};
pub use labels::{Label, LabelConfig, LabelPlan, LabelStrategy, place_labels};
pub use scale::LinearScale;
pub use scrolly_core::geometry::{Point, Rect, Sides, Size};
pub use sizing::{LayoutGeometry, Length, MarginSpec, SizeLimits, compute_geometry};

use std::fmt;

/// Errors raised while resolving layout geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Container size is zero, negative or not finite.
    InvalidContainer { width: f64, height: f64 },
    /// Aspect ratio is zero, negative or not finite.
    InvalidAspectRatio(f64),
    /// Layout string is not one of `single`, `dual`, `triple`, `grid`.
    UnknownLayout(String),
    /// A fixed-count layout received the wrong number of charts.
    ChartCount {
        layout: LayoutKind,
        expected: usize,
        found: usize,
    },
    /// A config field failed validation.
    InvalidConfig {
        field: &'static str,
        message: String,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidContainer { width, height } => {
                write!(f, "invalid container size {width}x{height}")
            }
            Self::InvalidAspectRatio(r) => write!(f, "invalid aspect ratio {r}"),
            Self::UnknownLayout(name) => write!(f, "unknown layout '{name}'"),
            Self::ChartCount {
                layout,
                expected,
                found,
            } => write!(
                f,
                "{layout} layout requires exactly {expected} charts, got {found}"
            ),
            Self::InvalidConfig { field, message } => write!(f, "{field}: {message}"),
        }
    }
}

impl std::error::Error for LayoutError {}

// ---------------------------------------------------------------------------
// Flex
// ---------------------------------------------------------------------------

/// Main axis of a [`Flex`] split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    /// Left to right.
    #[default]
    Row,
    /// Top to bottom.
    Column,
}

/// A flex-style container: splits a rectangle into equal cells along one axis.
#[derive(Debug, Clone, Default)]
pub struct Flex {
    axis: Axis,
    count: usize,
    gap: f64,
}

impl Flex {
    /// `count` equal cells.
    pub fn equal(axis: Axis, count: usize) -> Self {
        Self {
            axis,
            count,
            gap: 0.0,
        }
    }

    /// Set the gap between adjacent cells. Negative gaps are treated as zero.
    #[must_use]
    pub fn gap(mut self, gap: f64) -> Self {
        self.gap = gap.max(0.0);
        self
    }

    /// Split `area` into `count` rectangles. Cells collapse to zero when the
    /// gaps take up the whole extent.
    pub fn split(&self, area: Rect) -> Vec<Rect> {
        if self.count == 0 {
            return Vec::new();
        }

        let total = match self.axis {
            Axis::Row => area.width,
            Axis::Column => area.height,
        };
        let available = (total - self.gap * (self.count - 1) as f64).max(0.0);
        let size = available / self.count as f64;

        let start = match self.axis {
            Axis::Row => area.x,
            Axis::Column => area.y,
        };
        (0..self.count)
            .map(|i| {
                let offset = start + i as f64 * (size + self.gap);
                match self.axis {
                    Axis::Row => Rect::new(offset, area.y, size, area.height),
                    Axis::Column => Rect::new(area.x, offset, area.width, size),
                }
            })
            .collect()
    }
}
