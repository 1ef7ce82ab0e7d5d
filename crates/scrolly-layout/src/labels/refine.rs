//! Force relaxation of label positions.
//!
//! Labels repel each other vertically while a weak spring pulls each one
//! toward its anchor. The spring weakens linearly over the run so the final
//! iterations are pure separation. Labels keep their anchor order: a pair
//! that crosses is pushed back apart in that order, so leader lines never
//! cross. The pass is fully deterministic.

use super::{Label, LabelConfig, PlacementError, anchor_order};

/// Initial spring strength toward the anchor, per iteration.
const ATTRACTION: f64 = 0.1;

/// Total movement below which the system is considered settled.
const SETTLED: f64 = 1e-6;

/// Relax label positions within the chart grown by `refine_extension`.
///
/// Works on a copy: on error the labels are left as they were.
pub fn refine(
    labels: &mut [Label],
    chart_width: f64,
    chart_height: f64,
    config: &LabelConfig,
) -> Result<(), PlacementError> {
    if let Some(index) = labels.iter().position(|l| !l.is_finite()) {
        return Err(PlacementError::NonFinite { index });
    }

    let n = labels.len();
    let order = anchor_order(labels);
    let pad = config.collision_padding;
    let bound_w = chart_width + config.refine_extension.width;
    let bound_h = chart_height + config.refine_extension.height;
    let iterations = config.iterations.max(1);

    let mut ys: Vec<f64> = labels.iter().map(|l| l.y).collect();
    let xs: Vec<f64> = labels
        .iter()
        .map(|l| l.x.min(bound_w - l.width).max(0.0))
        .collect();

    let mut ran = 0;
    for iter in 0..iterations {
        ran = iter + 1;
        let pull = ATTRACTION * (1.0 - iter as f64 / iterations as f64);
        let mut moved = 0.0;

        for (i, label) in labels.iter().enumerate() {
            let dy = (label.anchor.y - ys[i]) * pull;
            ys[i] += dy;
            moved += dy.abs();
        }

        for a in 0..n {
            for b in (a + 1)..n {
                let (upper, lower) = (order[a], order[b]);
                let (lu, ll) = (&labels[upper], &labels[lower]);
                let overlap_x = xs[upper] - pad < xs[lower] + ll.width + pad
                    && xs[lower] - pad < xs[upper] + lu.width + pad;
                if !overlap_x {
                    continue;
                }
                let required = (lu.height + ll.height) / 2.0 + 2.0 * pad;
                let gap = ys[lower] - ys[upper];
                if gap < required {
                    let push = (required - gap) / 2.0;
                    ys[upper] -= push;
                    ys[lower] += push;
                    moved += 2.0 * push;
                }
            }
        }

        for (y, label) in ys.iter_mut().zip(labels.iter()) {
            let half = label.height / 2.0;
            *y = y.min(bound_h - half).max(half);
        }

        if !moved.is_finite() {
            return Err(PlacementError::Diverged);
        }
        if moved < SETTLED {
            break;
        }
    }

    if ys.iter().any(|y| !y.is_finite()) {
        return Err(PlacementError::Diverged);
    }
    scrolly_core::trace!(iterations = ran, "label relaxation finished");

    for ((label, y), x) in labels.iter_mut().zip(ys).zip(xs) {
        label.y = y;
        label.x = x;
    }
    Ok(())
}
