//! Property-based invariant tests for geometry primitives (Rect, Size, Point).
//!
//! 1. `intersects` is symmetric.
//! 2. Padding grows both rectangles' overlap set, never shrinks it.
//! 3. Clamped sizes stay within their limits.
//! 4. Distance is symmetric.

use proptest::prelude::*;
use scrolly_core::geometry::{Point, Rect, Size};

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-500.0f64..500.0, -500.0f64..500.0, 0.0f64..500.0, 0.0f64..500.0)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

proptest! {
    #[test]
    fn intersects_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(a.intersects(&b), b.intersects(&a));
    }

    #[test]
    fn padding_preserves_overlap(a in rect_strategy(), b in rect_strategy(), pad in 0.0f64..50.0) {
        if a.intersects(&b) {
            prop_assert!(a.padded(pad).intersects(&b));
            prop_assert!(a.padded(pad).intersects(&b.padded(pad)));
        }
    }

    #[test]
    fn clamped_size_within_limits(
        w in 0.0f64..5000.0,
        h in 0.0f64..5000.0,
        min in 0.0f64..300.0,
        extra in 0.0f64..1000.0,
    ) {
        let max = min + extra;
        let s = Size::new(w, h)
            .clamp_min(Size::new(min, min))
            .clamp_max(Size::new(max, max));
        prop_assert!(s.width >= min && s.width <= max);
        prop_assert!(s.height >= min && s.height <= max);
    }

    #[test]
    fn distance_is_symmetric(x0 in -1e3f64..1e3, y0 in -1e3f64..1e3, x1 in -1e3f64..1e3, y1 in -1e3f64..1e3) {
        let a = Point::new(x0, y0);
        let b = Point::new(x1, y1);
        prop_assert!((a.distance(b) - b.distance(a)).abs() < 1e-9);
    }
}
