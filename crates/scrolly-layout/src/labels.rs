#![forbid(unsafe_code)]

//! End-of-line label placement for multi-series line charts.
//!
//! # Coordinates
//!
//! Chart-local pixels: `(0, 0)` is the top-left of the plot area and labels
//! may extend to the right of it by up to `max_extension`. A [`Label`]'s `x`
//! is its left edge and `y` its vertical center.
//!
//! # Strategies
//!
//! | strategy  | what runs                                                           |
//! |-----------|---------------------------------------------------------------------|
//! | `Stacked` | centered column, uniform spacing, zero overlap by construction       |
//! | `Refined` | force relaxation, pairwise collision pass on failure, then clamping  |
//!
//! Side-by-side charts use [`place_labels_dual`], a compact variant with no
//! refinement and no leader lines.
//!
//! [`place_labels`] never removes a label and never fails; problems are
//! logged and handled by the next fallback.

mod collision;
mod inline;
mod refine;
mod stacking;

pub use collision::{avoid_collisions, boxes_overlap};
pub use inline::{
    ChartFrame, DataPoint, InlineLabeler, LabelPlan, LeaderLine, LegendEntry, Palette, Series,
    leader_lines,
};
pub use refine::refine;
pub use stacking::{stack_centered, stack_dual};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::LayoutError;
use scrolly_core::geometry::{Point, Rect, Size};

/// A chart label and the data point it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    /// The data point the label refers to. Never moved by placement.
    pub anchor: Point,
    /// Left edge.
    pub x: f64,
    /// Vertical center.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Displayed (possibly truncated) text.
    pub text: String,
    /// Untruncated text, shown as a tooltip when it differs from `text`.
    pub full_text: String,
    pub color: String,
}

impl Label {
    /// A label of `size` sitting on its anchor.
    pub fn new(anchor: Point, size: Size, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            anchor,
            x: anchor.x,
            y: anchor.y,
            width: size.width,
            height: size.height,
            full_text: text.clone(),
            text,
            color: String::new(),
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn with_full_text(mut self, full_text: impl Into<String>) -> Self {
        self.full_text = full_text.into();
        self
    }

    #[inline]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bounding box of the rendered text.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y - self.height / 2.0, self.width, self.height)
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.text != self.full_text
    }

    /// Distance from the anchor to the label position.
    #[inline]
    pub fn leader_distance(&self) -> f64 {
        self.anchor.distance(self.position())
    }

    /// Whether the label sits far enough from its anchor to need a leader line.
    #[inline]
    pub fn needs_leader(&self, threshold: f64) -> bool {
        self.leader_distance() > threshold
    }

    fn is_finite(&self) -> bool {
        self.anchor.is_finite()
            && self.position().is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

/// Placement algorithm for full-width charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStrategy {
    /// Deterministic centered column.
    #[default]
    Stacked,
    /// Force relaxation toward anchors, with collision fallback.
    Refined,
}

/// Tuning for [`place_labels`] and [`InlineLabeler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelConfig {
    pub strategy: LabelStrategy,
    /// Horizontal offset of a label's initial position from its anchor.
    pub offset_x: f64,
    /// Gap between stacked labels, and extra clearance in the collision pass.
    pub min_spacing: f64,
    /// Horizontal clearance the collision pass enforces.
    pub min_distance: f64,
    /// Top and bottom margin of the stacked column.
    pub edge_margin: f64,
    /// Distance of the stacked column from the right edge of the plot.
    pub column_offset: f64,
    /// Space kept between the column and the end of the extension area.
    pub column_margin: f64,
    /// How far right of the plot area labels may extend.
    pub max_extension: f64,
    /// Padding around each label box in overlap tests.
    pub collision_padding: f64,
    pub iterations: usize,
    /// Extra room the relaxation may use before the final clamp.
    pub refine_extension: Size,
    /// Labels closer than this to their anchor get no leader line.
    pub leader_threshold: f64,
    pub leader_lines: bool,
    /// Below this viewport width a legend replaces inline labels.
    pub responsive_threshold: f64,
    /// Maximum label width as a fraction of the chart width.
    pub max_label_width_ratio: f64,
    pub dual: DualLabelConfig,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            strategy: LabelStrategy::Stacked,
            offset_x: 15.0,
            min_spacing: 20.0,
            min_distance: 20.0,
            edge_margin: 20.0,
            column_offset: 60.0,
            column_margin: 10.0,
            max_extension: 200.0,
            collision_padding: 5.0,
            iterations: 1000,
            refine_extension: Size::new(150.0, 50.0),
            leader_threshold: 10.0,
            leader_lines: true,
            responsive_threshold: 600.0,
            max_label_width_ratio: 0.3,
            dual: DualLabelConfig::default(),
        }
    }
}

/// Tuning for the compact side-by-side variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DualLabelConfig {
    /// How far above its anchor a label is placed.
    pub upward_offset: f64,
    pub spacing: f64,
    pub offset_x: f64,
    pub max_extension: f64,
    pub column_margin: f64,
    /// Labels stay at least this far above the bottom edge.
    pub bottom_margin: f64,
    pub max_label_width_ratio: f64,
    /// Text size estimate used when measurement fails.
    pub fallback_char_width: f64,
    pub fallback_line_height: f64,
}

impl Default for DualLabelConfig {
    fn default() -> Self {
        Self {
            upward_offset: 60.0,
            spacing: 18.0,
            offset_x: 8.0,
            max_extension: 50.0,
            column_margin: 5.0,
            bottom_margin: 10.0,
            max_label_width_ratio: 0.4,
            fallback_char_width: 7.0,
            fallback_line_height: 12.0,
        }
    }
}

impl LabelConfig {
    /// Check every field, returning all violations.
    pub fn validate(&self) -> Result<(), Vec<LayoutError>> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &'static str, message: &str| {
            if !ok {
                errors.push(LayoutError::InvalidConfig {
                    field,
                    message: message.to_owned(),
                });
            }
        };

        check(self.min_spacing > 0.0, "labels.minSpacing", "must be positive");
        check(self.min_distance >= 0.0, "labels.minDistance", "must not be negative");
        check(self.edge_margin >= 0.0, "labels.edgeMargin", "must not be negative");
        check(self.max_extension >= 0.0, "labels.maxExtension", "must not be negative");
        check(self.collision_padding >= 0.0, "labels.collisionPadding", "must not be negative");
        check(self.iterations > 0, "labels.iterations", "must be at least 1");
        check(self.leader_threshold >= 0.0, "labels.leaderThreshold", "must not be negative");
        check(
            self.max_label_width_ratio > 0.0 && self.max_label_width_ratio <= 1.0,
            "labels.maxLabelWidthRatio",
            "must be in (0, 1]",
        );
        check(self.dual.spacing > 0.0, "labels.dual.spacing", "must be positive");
        check(
            self.dual.max_label_width_ratio > 0.0 && self.dual.max_label_width_ratio <= 1.0,
            "labels.dual.maxLabelWidthRatio",
            "must be in (0, 1]",
        );

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Failure of the refinement pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementError {
    /// A label had a non-finite anchor, position or size on input.
    NonFinite { index: usize },
    /// Relaxation produced non-finite positions.
    Diverged,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { index } => write!(f, "label {index} has non-finite geometry"),
            Self::Diverged => write!(f, "label relaxation diverged"),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Position `labels` in place for a chart of the given plot size.
pub fn place_labels(labels: &mut [Label], chart_width: f64, chart_height: f64, config: &LabelConfig) {
    if labels.is_empty() {
        return;
    }
    if !(chart_width.is_finite() && chart_height.is_finite()) {
        scrolly_core::warn!(chart_width, chart_height, "skipping label placement: non-finite chart size");
        return;
    }
    let _span = scrolly_core::debug_span!("place_labels", count = labels.len()).entered();

    match config.strategy {
        LabelStrategy::Stacked => stack_centered(labels, chart_width, chart_height, config),
        LabelStrategy::Refined => {
            if let Err(err) = refine(labels, chart_width, chart_height, config) {
                scrolly_core::warn!(%err, "label refinement failed, using collision pass");
                avoid_collisions(labels, config);
            }
            clamp_to_chart(labels, chart_width, chart_height, config.max_extension);
        }
    }
}

/// Position `labels` for one chart of a side-by-side pair.
pub fn place_labels_dual(
    labels: &mut [Label],
    chart_width: f64,
    chart_height: f64,
    config: &DualLabelConfig,
) {
    if labels.is_empty() || !(chart_width.is_finite() && chart_height.is_finite()) {
        return;
    }
    stack_dual(labels, chart_width, chart_height, config);
}

/// Keep every label inside `[0, width + max_extension] x [0, height]`.
///
/// A label taller or wider than the space is pinned to the top or left edge.
pub fn clamp_to_chart(labels: &mut [Label], chart_width: f64, chart_height: f64, max_extension: f64) {
    for label in labels {
        let max_x = chart_width + max_extension - label.width;
        let half = label.height / 2.0;
        label.x = label.x.min(max_x).max(0.0);
        label.y = label.y.min(chart_height - half).max(half);
    }
}

/// Label indices sorted by anchor y, top first. Ties keep input order.
pub(crate) fn anchor_order(labels: &[Label]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| labels[a].anchor.y.total_cmp(&labels[b].anchor.y));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(anchor_y: f64) -> Label {
        Label::new(Point::new(600.0, anchor_y), Size::new(40.0, 14.0), "name")
    }

    #[test]
    fn new_label_sits_on_anchor() {
        let l = label(120.0);
        assert_eq!(l.position(), l.anchor);
        assert_eq!(l.bounds(), Rect::new(600.0, 113.0, 40.0, 14.0));
        assert!(!l.is_truncated());
        assert!(!l.needs_leader(10.0));
    }

    #[test]
    fn leader_threshold_is_exclusive() {
        let mut l = label(100.0);
        l.x += 10.0;
        assert!(!l.needs_leader(10.0));
        l.x += 0.5;
        assert!(l.needs_leader(10.0));
    }

    #[test]
    fn anchor_order_is_stable() {
        let labels = vec![label(50.0), label(10.0), label(50.0), label(f64::NAN)];
        assert_eq!(anchor_order(&labels), vec![1, 0, 2, 3]);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(LabelConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_reports_every_violation() {
        let config = LabelConfig {
            min_spacing: 0.0,
            iterations: 0,
            max_label_width_ratio: 1.5,
            ..LabelConfig::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn config_from_partial_json() {
        let config: LabelConfig =
            serde_json::from_str(r#"{"strategy": "refined", "minSpacing": 12, "dual": {"spacing": 16}}"#)
                .unwrap();
        assert_eq!(config.strategy, LabelStrategy::Refined);
        assert_eq!(config.min_spacing, 12.0);
        assert_eq!(config.dual.spacing, 16.0);
        assert_eq!(config.dual.upward_offset, 60.0);
        assert_eq!(config.iterations, 1000);
    }

    #[test]
    fn clamp_keeps_labels_in_extended_area() {
        let mut labels = vec![label(-30.0), label(900.0)];
        labels[0].x = -5.0;
        labels[1].x = 2000.0;
        clamp_to_chart(&mut labels, 600.0, 400.0, 200.0);
        assert_eq!(labels[0].position(), Point::new(0.0, 7.0));
        assert_eq!(labels[1].position(), Point::new(760.0, 393.0));
    }

    #[test]
    fn placement_never_removes_labels() {
        let mut labels: Vec<Label> = (0..12).map(|i| label(i as f64 * 3.0)).collect();
        for strategy in [LabelStrategy::Stacked, LabelStrategy::Refined] {
            let config = LabelConfig {
                strategy,
                ..LabelConfig::default()
            };
            place_labels(&mut labels, 600.0, 400.0, &config);
            assert_eq!(labels.len(), 12);
            assert!(labels.iter().all(|l| l.position().is_finite()));
        }
    }

    #[test]
    fn non_finite_chart_leaves_labels_alone() {
        let mut labels = vec![label(10.0)];
        let before = labels.clone();
        place_labels(&mut labels, f64::NAN, 400.0, &LabelConfig::default());
        assert_eq!(labels, before);
    }
}
