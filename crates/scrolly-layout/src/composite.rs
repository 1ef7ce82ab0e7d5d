#![forbid(unsafe_code)]

//! Multi-chart compositions.
//!
//! A [`CompositeLayout`] partitions a shared container into equal cells with
//! [`Flex`](crate::Flex) and runs [`compute_geometry`] on each cell as if it
//! were its own container.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sizing::{LayoutGeometry, Length, MarginSpec, SizeLimits, compute_geometry};
use crate::{Axis, Flex, LayoutError};
use scrolly_core::geometry::{Rect, Size};

/// Declared layout of a step's chart area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Single,
    Dual,
    Triple,
    Grid,
}

impl LayoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Dual => "dual",
            Self::Triple => "triple",
            Self::Grid => "grid",
        }
    }

    /// Exact number of charts the layout takes, `None` for grid.
    pub const fn chart_count(self) -> Option<usize> {
        match self {
            Self::Single => Some(1),
            Self::Dual => Some(2),
            Self::Triple => Some(3),
            Self::Grid => None,
        }
    }

    /// Inter-cell gap used when none is configured.
    pub const fn default_gap(self) -> f64 {
        match self {
            Self::Single => 0.0,
            Self::Dual => 40.0,
            Self::Triple | Self::Grid => 30.0,
        }
    }

    /// Fail unless `found` charts fit this layout.
    pub fn check_count(self, found: usize) -> Result<(), LayoutError> {
        match self.chart_count() {
            Some(expected) if expected != found => Err(LayoutError::ChartCount {
                layout: self,
                expected,
                found,
            }),
            None if found == 0 => Err(LayoutError::ChartCount {
                layout: self,
                expected: 1,
                found,
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "dual" => Ok(Self::Dual),
            "triple" => Ok(Self::Triple),
            "grid" => Ok(Self::Grid),
            other => Err(LayoutError::UnknownLayout(other.to_owned())),
        }
    }
}

/// Direction charts are laid out in for dual and triple layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrangement {
    /// Side by side.
    #[default]
    Horizontal,
    /// Stacked.
    Vertical,
}

impl Arrangement {
    const fn axis(self) -> Axis {
        match self {
            Self::Horizontal => Axis::Row,
            Self::Vertical => Axis::Column,
        }
    }
}

/// Optional explicit size of a single chart within its cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CellSize {
    pub width: Option<Length>,
    pub height: Option<Length>,
}

impl CellSize {
    /// Size of the chart's container: the override where given, else the cell.
    ///
    /// Relative overrides resolve against the cell.
    pub fn resolve(&self, cell: Rect) -> Size {
        Size::new(
            self.width.map_or(cell.width, |w| w.resolve(cell.width)),
            self.height.map_or(cell.height, |h| h.resolve(cell.height)),
        )
    }
}

/// Partitioning of a shared container into chart cells.
#[derive(Debug, Clone, Default)]
pub struct CompositeLayout {
    kind: LayoutKind,
    arrangement: Arrangement,
    gap: Option<f64>,
}

impl CompositeLayout {
    pub fn new(kind: LayoutKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn arrangement(mut self, arrangement: Arrangement) -> Self {
        self.arrangement = arrangement;
        self
    }

    /// Override the inter-cell gap.
    #[must_use]
    pub fn gap(mut self, gap: f64) -> Self {
        self.gap = Some(gap);
        self
    }

    #[inline]
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    #[inline]
    pub fn effective_gap(&self) -> f64 {
        self.gap.unwrap_or(self.kind.default_gap())
    }

    /// Split `area` into `cells` rectangles, in chart order.
    pub fn partition(&self, area: Rect, cells: usize) -> Result<Vec<Rect>, LayoutError> {
        self.kind.check_count(cells)?;
        let gap = self.effective_gap();

        let rects = match self.kind {
            LayoutKind::Single => vec![area],
            LayoutKind::Dual | LayoutKind::Triple => Flex::equal(self.arrangement.axis(), cells)
                .gap(gap)
                .split(area),
            LayoutKind::Grid => {
                let (columns, rows) = grid_shape(cells);
                Flex::equal(Axis::Column, rows)
                    .gap(gap)
                    .split(area)
                    .into_iter()
                    .flat_map(|row| Flex::equal(Axis::Row, columns).gap(gap).split(row))
                    .take(cells)
                    .collect()
            }
        };
        Ok(rects)
    }

    /// Partition `area` and compute one chart geometry per cell.
    ///
    /// `sizes` holds per-chart overrides; missing entries use the whole cell.
    pub fn geometries(
        &self,
        area: Rect,
        sizes: &[CellSize],
        cells: usize,
        margin: &MarginSpec,
        aspect_ratio: Option<f64>,
        limits: &SizeLimits,
    ) -> Result<Vec<LayoutGeometry>, LayoutError> {
        self.partition(area, cells)?
            .into_iter()
            .enumerate()
            .map(|(i, cell)| {
                let container = sizes.get(i).copied().unwrap_or_default().resolve(cell);
                compute_geometry(container, margin, aspect_ratio, limits)
            })
            .collect()
    }
}

/// Grid columns and rows for `n` cells: `ceil(sqrt(n))` columns.
pub fn grid_shape(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let columns = (n as f64).sqrt().ceil() as usize;
    (columns, n.div_ceil(columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_layout_kind() {
        assert_eq!("dual".parse::<LayoutKind>().unwrap(), LayoutKind::Dual);
        assert!(matches!(
            "quad".parse::<LayoutKind>(),
            Err(LayoutError::UnknownLayout(s)) if s == "quad"
        ));
    }

    #[test]
    fn dual_requires_exactly_two() {
        let layout = CompositeLayout::new(LayoutKind::Dual);
        let area = Rect::new(0.0, 0.0, 1000.0, 400.0);
        for n in [1, 3] {
            assert!(matches!(
                layout.partition(area, n),
                Err(LayoutError::ChartCount {
                    expected: 2,
                    ..
                })
            ));
        }
        let cells = layout.partition(area, 2).unwrap();
        assert_eq!(cells[0].width, 480.0);
        assert_eq!(cells[1].x, 520.0);
    }

    #[test]
    fn triple_vertical_uses_30px_gap() {
        let cells = CompositeLayout::new(LayoutKind::Triple)
            .arrangement(Arrangement::Vertical)
            .partition(Rect::new(0.0, 0.0, 600.0, 960.0), 3)
            .unwrap();
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(|c| c.height == 300.0));
        assert_eq!(cells[2].y, 660.0);
    }

    #[test]
    fn grid_shapes() {
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(4), (2, 2));
        assert_eq!(grid_shape(5), (3, 2));
        assert_eq!(grid_shape(10), (4, 3));
    }

    #[test]
    fn grid_partition_is_row_major() {
        let cells = CompositeLayout::new(LayoutKind::Grid)
            .gap(0.0)
            .partition(Rect::new(0.0, 0.0, 300.0, 200.0), 5)
            .unwrap();
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[0], Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(cells[3], Rect::new(0.0, 100.0, 100.0, 100.0));
    }

    #[test]
    fn empty_grid_is_an_error() {
        assert!(
            CompositeLayout::new(LayoutKind::Grid)
                .partition(Rect::new(0.0, 0.0, 10.0, 10.0), 0)
                .is_err()
        );
    }

    #[test]
    fn per_chart_overrides() {
        let geos = CompositeLayout::new(LayoutKind::Dual)
            .geometries(
                Rect::new(0.0, 0.0, 1040.0, 600.0),
                &[CellSize {
                    width: Some(Length::Fraction(0.75)),
                    height: Some(Length::Px(300.0)),
                }],
                2,
                &MarginSpec::px(0.0, 0.0, 0.0, 0.0),
                None,
                &SizeLimits::UNBOUNDED,
            )
            .unwrap();
        assert_eq!(geos[0].total_size(), Size::new(375.0, 300.0));
        assert_eq!(geos[1].total_size(), Size::new(500.0, 600.0));
    }
}
