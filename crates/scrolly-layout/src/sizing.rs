#![forbid(unsafe_code)]

//! Responsive chart geometry.
//!
//! [`compute_geometry`] turns a container size, a margin spec and an optional
//! aspect ratio into a [`LayoutGeometry`]: total drawing size, resolved
//! margins and the inner plot area. It is a pure function; the caller
//! recomputes it on every settled resize.

use serde::{Deserialize, Serialize};

use crate::LayoutError;
use scrolly_core::geometry::{Rect, Sides, Size};

/// A length that is either absolute or relative to a reference extent.
///
/// Deserializes from a number or a string:
///
/// | input      | value                |
/// |------------|----------------------|
/// | `20`       | `Px(20.0)`           |
/// | `0.08`     | `Fraction(0.08)`     |
/// | `"8%"`     | `Fraction(0.08)`     |
/// | `"12px"`   | `Px(12.0)`           |
///
/// Numbers strictly between 0 and 1 are fractions; a sub-pixel margin is
/// never meant literally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "LengthRepr")]
pub enum Length {
    Px(f64),
    Fraction(f64),
}

impl Length {
    /// Resolve against `reference` (the container extent along the same axis).
    #[inline]
    pub fn resolve(self, reference: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Fraction(f) => f * reference,
        }
    }

    #[inline]
    pub fn is_relative(self) -> bool {
        matches!(self, Self::Fraction(_))
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<LengthRepr> for Length {
    type Error = String;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Number(n) if !n.is_finite() || n < 0.0 => {
                Err(format!("length must be a non-negative number, got {n}"))
            }
            LengthRepr::Number(n) if n > 0.0 && n < 1.0 => Ok(Self::Fraction(n)),
            LengthRepr::Number(n) => Ok(Self::Px(n)),
            LengthRepr::Text(s) => parse_length(&s),
        }
    }
}

impl From<Length> for LengthRepr {
    fn from(len: Length) -> Self {
        match len {
            Length::Px(px) => Self::Number(px),
            Length::Fraction(f) => Self::Text(format!("{}%", f * 100.0)),
        }
    }
}

fn parse_length(s: &str) -> Result<Length, String> {
    let s = s.trim();
    let (digits, percent) = if let Some(d) = s.strip_suffix('%') {
        (d, true)
    } else if let Some(d) = s.strip_suffix("px") {
        (d, false)
    } else {
        (s, false)
    };
    let value: f64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid length '{s}'"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("length must be non-negative, got '{s}'"));
    }
    Ok(if percent {
        Length::Fraction(value / 100.0)
    } else {
        Length::Px(value)
    })
}

/// Margins around the plot area, each absolute or relative.
///
/// Vertical margins resolve against the container height, horizontal ones
/// against its width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginSpec {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Default for MarginSpec {
    fn default() -> Self {
        Self::px(20.0, 20.0, 40.0, 40.0)
    }
}

impl MarginSpec {
    /// Absolute margins.
    pub const fn px(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top: Length::Px(top),
            right: Length::Px(right),
            bottom: Length::Px(bottom),
            left: Length::Px(left),
        }
    }

    /// Margins as fractions of the container.
    pub const fn fraction(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top: Length::Fraction(top),
            right: Length::Fraction(right),
            bottom: Length::Fraction(bottom),
            left: Length::Fraction(left),
        }
    }

    /// Resolve to pixels against `container`.
    pub fn resolve(&self, container: Size) -> Sides {
        Sides::new(
            self.top.resolve(container.height),
            self.right.resolve(container.width),
            self.bottom.resolve(container.height),
            self.left.resolve(container.width),
        )
    }
}

/// Minimum and maximum total chart size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizeLimits {
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: f64,
    pub max_height: f64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min_width: 300.0,
            min_height: 200.0,
            max_width: 1200.0,
            max_height: 800.0,
        }
    }
}

impl SizeLimits {
    /// No clamping at all.
    pub const UNBOUNDED: Self = Self {
        min_width: 0.0,
        min_height: 0.0,
        max_width: f64::INFINITY,
        max_height: f64::INFINITY,
    };

    #[inline]
    pub fn min(&self) -> Size {
        Size::new(self.min_width, self.min_height)
    }

    #[inline]
    pub fn max(&self) -> Size {
        Size::new(self.max_width, self.max_height)
    }

    /// Check the limits are usable: non-negative and `min <= max` on both axes.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let ok = self.min_width >= 0.0
            && self.min_height >= 0.0
            && self.min_width <= self.max_width
            && self.min_height <= self.max_height;
        if ok {
            Ok(())
        } else {
            Err(LayoutError::InvalidConfig {
                field: "sizeLimits",
                message: format!(
                    "min {}x{} exceeds max {}x{}",
                    self.min_width, self.min_height, self.max_width, self.max_height
                ),
            })
        }
    }

    /// Clamp each axis independently. Max wins over min.
    fn clamp(&self, size: Size) -> Size {
        size.clamp_min(self.min()).clamp_max(self.max())
    }

    /// Scale `size` uniformly into the limits. Max wins over min.
    fn clamp_uniform(&self, size: Size) -> Size {
        let grow = (self.min_width / size.width)
            .max(self.min_height / size.height)
            .max(1.0);
        let mut out = Size::new(size.width * grow, size.height * grow);
        let shrink = (self.max_width / out.width)
            .min(self.max_height / out.height)
            .min(1.0);
        out.width *= shrink;
        out.height *= shrink;
        out
    }
}

/// Resolved dimensions of one chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGeometry {
    pub total_width: f64,
    pub total_height: f64,
    pub margin: Sides,
    pub inner_width: f64,
    pub inner_height: f64,
}

impl LayoutGeometry {
    #[inline]
    pub fn total_size(&self) -> Size {
        Size::new(self.total_width, self.total_height)
    }

    /// Plot area in chart-local coordinates.
    #[inline]
    pub fn inner_rect(&self) -> Rect {
        Rect::new(
            self.margin.left,
            self.margin.top,
            self.inner_width,
            self.inner_height,
        )
    }
}

/// Compute the geometry of one chart inside `container`.
///
/// With an aspect ratio, the box is the largest one of that ratio that fits
/// the container, then scaled uniformly into `limits`. Without one, each axis
/// is clamped on its own. Margins always resolve against the original
/// container, not the ratio-adjusted box.
pub fn compute_geometry(
    container: Size,
    margin: &MarginSpec,
    aspect_ratio: Option<f64>,
    limits: &SizeLimits,
) -> Result<LayoutGeometry, LayoutError> {
    if container.is_degenerate() {
        return Err(LayoutError::InvalidContainer {
            width: container.width,
            height: container.height,
        });
    }

    let total = match aspect_ratio {
        Some(ratio) if !ratio.is_finite() || ratio <= 0.0 => {
            return Err(LayoutError::InvalidAspectRatio(ratio));
        }
        Some(ratio) => {
            let from_height = Size::new(container.height * ratio, container.height);
            let from_width = Size::new(container.width, container.width / ratio);
            let fitted = if from_height.width <= container.width {
                from_height
            } else {
                from_width
            };
            limits.clamp_uniform(fitted)
        }
        None => limits.clamp(container),
    };

    let sides = margin.resolve(container);
    Ok(LayoutGeometry {
        total_width: total.width,
        total_height: total.height,
        margin: sides,
        inner_width: (total.width - sides.horizontal_sum()).max(0.0),
        inner_height: (total.height - sides.vertical_sum()).max(0.0),
    })
}
