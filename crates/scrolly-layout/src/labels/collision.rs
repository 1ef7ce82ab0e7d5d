//! Pairwise collision avoidance, the fallback when refinement fails.

use super::{Label, LabelConfig, anchor_order};
use scrolly_core::geometry::Rect;

/// Whether two label boxes, each grown by `padding`, come within
/// `min_distance` of each other on both axes.
#[inline]
pub fn boxes_overlap(a: Rect, b: Rect, padding: f64, min_distance: f64) -> bool {
    a.padded(padding).intersects(&b.padded(padding + min_distance))
}

/// Single pass in anchor order: each label is checked against every label
/// placed before it and pushed off on overlap.
///
/// The vertical push clears the other label by `min_spacing` on the side the
/// current label already sits on; a label too close horizontally is also
/// shifted right by `min_distance`. Later pushes can reintroduce overlap with
/// earlier labels in very dense charts.
pub fn avoid_collisions(labels: &mut [Label], config: &LabelConfig) {
    let order = anchor_order(labels);
    for (k, &i) in order.iter().enumerate() {
        for &j in &order[..k] {
            let other = labels[j].bounds();
            let other_y = labels[j].y;
            let current = &mut labels[i];
            if !boxes_overlap(current.bounds(), other, config.collision_padding, config.min_distance) {
                continue;
            }

            let dy = current.y - other_y;
            let required = (current.height + other.height) / 2.0 + config.min_spacing;
            if dy.abs() < required {
                current.y = if dy >= 0.0 {
                    other_y + required
                } else {
                    other_y - required
                };
            }

            if (current.x - other.x).abs() < config.min_distance {
                current.x = current.x.max(other.x + config.min_distance);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrolly_core::geometry::{Point, Size};

    #[test]
    fn padded_overlap_includes_distance() {
        let a = Rect::new(0.0, 0.0, 40.0, 14.0);
        assert!(boxes_overlap(a, Rect::new(0.0, 30.0, 40.0, 14.0), 5.0, 20.0));
        assert!(!boxes_overlap(a, Rect::new(0.0, 60.0, 40.0, 14.0), 5.0, 20.0));
        assert!(!boxes_overlap(a, Rect::new(100.0, 0.0, 40.0, 14.0), 5.0, 20.0));
    }

    #[test]
    fn upward_push_when_above() {
        let mut labels = vec![
            Label::new(Point::new(600.0, 100.0), Size::new(40.0, 14.0), "a"),
            Label::new(Point::new(600.0, 101.0), Size::new(40.0, 14.0), "b"),
        ];
        // b is ordered second but drawn above a.
        labels[1].y = 95.0;
        avoid_collisions(&mut labels, &LabelConfig::default());
        assert_eq!(labels[1].y, 100.0 - 34.0);
        assert_eq!(labels[1].x, 620.0);
    }

    #[test]
    fn distant_labels_untouched() {
        let mut labels = vec![
            Label::new(Point::new(600.0, 10.0), Size::new(40.0, 14.0), "a"),
            Label::new(Point::new(600.0, 300.0), Size::new(40.0, 14.0), "b"),
        ];
        let before = labels.clone();
        avoid_collisions(&mut labels, &LabelConfig::default());
        assert_eq!(labels, before);
    }
}
