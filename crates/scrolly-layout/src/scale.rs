#![forbid(unsafe_code)]

//! Continuous linear scale from a data domain to pixel range.

/// Maps `domain` linearly onto `range`.
///
/// An empty domain (both ends equal) maps everything to the middle of the
/// range, which is where a single-value series is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub const fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Scale whose domain is the extent of `values`, or `None` if there are
    /// no finite values.
    pub fn from_extent(values: impl IntoIterator<Item = f64>, range: (f64, f64)) -> Option<Self> {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some(Self::new((lo, hi), range))
    }

    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    #[inline]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Map a domain value to the range. Values outside the domain extrapolate.
    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    /// Map a range value back to the domain.
    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return (d0 + d1) / 2.0;
        }
        d0 + (pixel - r0) / span * (d1 - d0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_y_range() {
        let y = LinearScale::new((0.0, 100.0), (400.0, 0.0));
        assert_eq!(y.apply(0.0), 400.0);
        assert_eq!(y.apply(100.0), 0.0);
        assert_eq!(y.apply(25.0), 300.0);
        assert_eq!(y.invert(300.0), 25.0);
    }

    #[test]
    fn degenerate_domain_maps_to_midpoint() {
        let s = LinearScale::new((5.0, 5.0), (0.0, 600.0));
        assert_eq!(s.apply(5.0), 300.0);
    }

    #[test]
    fn extent_ignores_non_finite() {
        let s = LinearScale::from_extent([3.0, f64::NAN, -1.0, 7.0], (0.0, 1.0)).unwrap();
        assert_eq!(s.domain(), (-1.0, 7.0));
        assert!(LinearScale::from_extent([f64::NAN], (0.0, 1.0)).is_none());
    }
}
