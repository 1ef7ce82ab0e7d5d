#![forbid(unsafe_code)]

//! Label placement invariants.
//!
//! | ID      | Invariant                                                         |
//! |---------|-------------------------------------------------------------------|
//! | STACK-1 | Stacked labels in anchor order keep `(h_i + h_j)/2 + spacing` apart |
//! | STACK-2 | Stacking is a pure function of its input                          |
//! | LEAD-1  | Leader line iff label is further than the threshold from anchor    |
//! | FALL-1  | Collision pass clusters converging labels, leaves isolated ones    |
//! | REF-1   | Refined placement stays inside the extended chart area            |

use proptest::prelude::*;
use scrolly_layout::labels::{
    Label, LabelConfig, LabelStrategy, avoid_collisions, clamp_to_chart, leader_lines,
    place_labels,
};
use scrolly_layout::{Point, Size};

const CHART_W: f64 = 600.0;
const CHART_H: f64 = 400.0;

fn label_strategy() -> impl Strategy<Value = Label> {
    (0.0f64..CHART_W, -50.0f64..450.0, 10.0f64..120.0, 8.0f64..30.0).prop_map(
        |(ax, ay, w, h)| Label::new(Point::new(ax, ay), Size::new(w, h), "series"),
    )
}

fn sorted_by_anchor(labels: &[Label]) -> Vec<&Label> {
    let mut sorted: Vec<&Label> = labels.iter().collect();
    sorted.sort_by(|a, b| a.anchor.y.total_cmp(&b.anchor.y));
    sorted
}

proptest! {
    #[test]
    fn stacked_labels_never_overlap(
        mut labels in proptest::collection::vec(label_strategy(), 1..25),
        spacing in 1.0f64..40.0,
    ) {
        let config = LabelConfig { min_spacing: spacing, ..LabelConfig::default() };
        place_labels(&mut labels, CHART_W, CHART_H, &config);

        let sorted = sorted_by_anchor(&labels);
        for i in 0..sorted.len() {
            for j in (i + 1)..sorted.len() {
                let (a, b) = (sorted[i], sorted[j]);
                let required = (a.height + b.height) / 2.0 + spacing;
                prop_assert!(
                    (b.y - a.y) + 1e-9 >= required,
                    "labels {} and {} are {} apart, need {}", i, j, b.y - a.y, required
                );
            }
        }
    }

    #[test]
    fn stacking_is_reproducible(labels in proptest::collection::vec(label_strategy(), 1..15)) {
        let config = LabelConfig::default();
        let mut a = labels.clone();
        let mut b = labels;
        place_labels(&mut a, CHART_W, CHART_H, &config);
        place_labels(&mut b, CHART_W, CHART_H, &config);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn refined_labels_stay_in_bounds(mut labels in proptest::collection::vec(label_strategy(), 1..12)) {
        let config = LabelConfig { strategy: LabelStrategy::Refined, ..LabelConfig::default() };
        let count = labels.len();
        place_labels(&mut labels, CHART_W, CHART_H, &config);
        prop_assert_eq!(labels.len(), count);
        for l in &labels {
            prop_assert!(l.x >= 0.0 && l.x + l.width <= CHART_W + config.max_extension + 1e-9);
            prop_assert!(l.y - l.height / 2.0 >= -1e-9);
            prop_assert!(l.y + l.height / 2.0 <= CHART_H + 1e-9);
        }
    }

    #[test]
    fn leader_line_iff_beyond_threshold(dx in -30.0f64..30.0, dy in -30.0f64..30.0) {
        let mut label = Label::new(Point::new(300.0, 200.0), Size::new(40.0, 14.0), "s");
        label.x += dx;
        label.y += dy;
        let lines = leader_lines(std::slice::from_ref(&label), 10.0);
        let far = (label.x - 300.0).hypot(label.y - 200.0) > 10.0;
        prop_assert_eq!(lines.len(), usize::from(far));
    }
}

#[test]
fn leader_lines_at_exact_distances() {
    let mut near = Label::new(Point::new(100.0, 100.0), Size::new(40.0, 14.0), "near");
    near.x += 6.0;
    near.y += 8.0; // exactly 10px away
    let mut far = Label::new(Point::new(100.0, 300.0), Size::new(40.0, 14.0), "far");
    far.x += 60.0;

    let lines = leader_lines(&[near, far], 10.0);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].from, Point::new(100.0, 300.0));
    assert_eq!(lines[0].to, Point::new(160.0, 300.0));
}

#[test]
fn converging_anchors_cluster_while_isolated_ones_stay() {
    let config = LabelConfig::default();
    let mut labels: Vec<Label> = [10.0, 12.0, 15.0, 200.0, 400.0]
        .into_iter()
        .map(|y| {
            let mut l = Label::new(Point::new(CHART_W, y), Size::new(40.0, 14.0), "s");
            l.x = CHART_W + config.offset_x;
            l
        })
        .collect();

    avoid_collisions(&mut labels, &config);
    clamp_to_chart(&mut labels, CHART_W, CHART_H, config.max_extension);

    let ys: Vec<f64> = labels.iter().map(|l| l.y).collect();
    assert_eq!(ys, vec![10.0, 44.0, 78.0, 200.0, 393.0]);
    let xs: Vec<f64> = labels.iter().map(|l| l.x).collect();
    assert_eq!(xs, vec![615.0, 635.0, 655.0, 615.0, 615.0]);
}

#[test]
fn refined_placement_of_converging_anchors() {
    let config = LabelConfig {
        strategy: LabelStrategy::Refined,
        ..LabelConfig::default()
    };
    let mut labels: Vec<Label> = [10.0, 12.0, 15.0, 200.0, 400.0]
        .into_iter()
        .map(|y| {
            let mut l = Label::new(Point::new(CHART_W, y), Size::new(40.0, 14.0), "s");
            l.x = CHART_W + config.offset_x;
            l
        })
        .collect();

    place_labels(&mut labels, CHART_W, CHART_H, &config);

    // The top three form one cluster without overlapping.
    for pair in labels[..3].windows(2) {
        assert!(pair[1].y - pair[0].y >= 14.0);
    }
    assert!(labels[2].y < 100.0);
    // Isolated labels keep their anchor, clamped to the chart.
    assert!((labels[3].y - 200.0).abs() < 1e-6);
    assert_eq!(labels[4].y, 393.0);
}

#[test]
fn crowded_stack_overflows_instead_of_shrinking() {
    let config = LabelConfig::default();
    let mut labels: Vec<Label> = (0..30)
        .map(|i| Label::new(Point::new(500.0, i as f64), Size::new(40.0, 14.0), "s"))
        .collect();
    place_labels(&mut labels, CHART_W, CHART_H, &config);

    assert_eq!(labels[0].y, config.edge_margin + 7.0);
    for pair in labels.windows(2) {
        assert_eq!(pair[1].y - pair[0].y, 14.0 + config.min_spacing);
    }
    assert!(labels[29].y > CHART_H);
}
