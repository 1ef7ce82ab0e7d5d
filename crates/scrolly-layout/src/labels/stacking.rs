//! Deterministic column stacking.

use super::{DualLabelConfig, Label, LabelConfig, anchor_order};

/// Stack labels in anchor order as one column centered on the chart.
///
/// Adjacent labels are exactly `min_spacing` apart, so boxes never overlap.
/// When the column is taller than the chart it overflows the bottom; only
/// the top is clamped to `edge_margin`, keeping the spacing uniform.
pub fn stack_centered(labels: &mut [Label], chart_width: f64, chart_height: f64, config: &LabelConfig) {
    let order = anchor_order(labels);
    let spacing = config.min_spacing;
    let required: f64 = labels.iter().map(|l| l.height).sum::<f64>()
        + spacing * labels.len().saturating_sub(1) as f64;

    let mut top = chart_height / 2.0 - required / 2.0;
    let bottom_limit = chart_height - config.edge_margin;
    if top + required > bottom_limit {
        top = bottom_limit - required;
    }
    top = top.max(config.edge_margin);

    let mut cursor = top;
    for &i in &order {
        let label = &mut labels[i];
        label.y = cursor + label.height / 2.0;
        cursor += label.height + spacing;
        label.x = column_x(
            chart_width,
            config.column_offset,
            config.max_extension,
            config.column_margin,
            label.width,
        );
    }
}

/// Compact stacking for side-by-side charts.
///
/// Each label is lifted `upward_offset` above its anchor and pushed down to
/// keep `spacing` from the one above, then clamped to
/// `[0, height - bottom_margin]`.
pub fn stack_dual(labels: &mut [Label], chart_width: f64, chart_height: f64, config: &DualLabelConfig) {
    let order = anchor_order(labels);
    let mut previous: Option<f64> = None;
    for &i in &order {
        let label = &mut labels[i];
        let preferred = label.anchor.y - config.upward_offset;
        let y = match previous {
            Some(prev) => preferred.max(prev + config.spacing),
            None => preferred,
        };
        label.y = y.min(chart_height - config.bottom_margin).max(0.0);
        previous = Some(label.y);
        label.x = column_x(
            chart_width,
            config.offset_x,
            config.max_extension,
            config.column_margin,
            label.width,
        );
    }
}

/// Shared x of a label column right of the plot.
fn column_x(chart_width: f64, offset: f64, max_extension: f64, margin: f64, label_width: f64) -> f64 {
    (chart_width + offset).min(chart_width + max_extension - label_width - margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrolly_core::geometry::{Point, Size};

    fn labels_at(ys: &[f64]) -> Vec<Label> {
        ys.iter()
            .map(|&y| Label::new(Point::new(580.0, y), Size::new(40.0, 14.0), "s"))
            .collect()
    }

    #[test]
    fn centered_column_with_uniform_gaps() {
        let mut labels = labels_at(&[300.0, 100.0, 200.0]);
        stack_centered(&mut labels, 600.0, 400.0, &LabelConfig::default());
        // 3 * 14 + 2 * 20 = 82 tall, centered on 200.
        assert_eq!(labels[1].y, 159.0 + 7.0);
        assert_eq!(labels[2].y, 166.0 + 34.0);
        assert_eq!(labels[0].y, 200.0 + 34.0);
        assert!(labels.iter().all(|l| l.x == 660.0));
    }

    #[test]
    fn wide_labels_pull_column_left() {
        let mut labels = labels_at(&[10.0]);
        labels[0].width = 180.0;
        stack_centered(&mut labels, 600.0, 400.0, &LabelConfig::default());
        assert_eq!(labels[0].x, 600.0 + 200.0 - 180.0 - 10.0);
    }

    #[test]
    fn crowded_column_overflows_bottom() {
        let ys: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut labels = labels_at(&ys);
        stack_centered(&mut labels, 600.0, 200.0, &LabelConfig::default());
        assert_eq!(labels[0].y, 20.0 + 7.0);
        assert!(labels[19].y > 200.0);
        for pair in labels.windows(2) {
            assert_eq!(pair[1].y - pair[0].y, 34.0);
        }
    }

    #[test]
    fn dual_lifts_and_spaces() {
        let mut labels = labels_at(&[100.0, 105.0, 300.0, 395.0]);
        stack_dual(&mut labels, 400.0, 400.0, &DualLabelConfig::default());
        assert_eq!(labels[0].y, 40.0);
        assert_eq!(labels[1].y, 58.0);
        assert_eq!(labels[2].y, 240.0);
        assert_eq!(labels[3].y, 335.0);
        // min(400 + 8, 400 + 50 - 40 - 5)
        assert!(labels.iter().all(|l| l.x == 405.0));
    }

    #[test]
    fn dual_clamps_to_top() {
        let mut labels = labels_at(&[20.0]);
        stack_dual(&mut labels, 400.0, 400.0, &DualLabelConfig::default());
        assert_eq!(labels[0].y, 0.0);
    }
}
