#![forbid(unsafe_code)]

//! Text measurement seam.
//!
//! The label engine never measures text itself. The drawing surface supplies
//! a [`TextMeasure`]; when it cannot answer (detached node, missing font)
//! [`HeuristicMeasure`] estimates instead.

use scrolly_core::geometry::Size;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ELLIPSIS: &str = "...";

/// Measures the rendered bounding box of a text run.
pub trait TextMeasure {
    /// Bounding box of `text`, or `None` if it could not be measured.
    fn measure(&self, text: &str) -> Option<Size>;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> Option<Size>,
{
    fn measure(&self, text: &str) -> Option<Size> {
        self(text)
    }
}

/// Fixed per-column estimate. Wide (CJK) characters count as two columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicMeasure {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for HeuristicMeasure {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 14.0,
        }
    }
}

impl HeuristicMeasure {
    pub const fn new(char_width: f64, line_height: f64) -> Self {
        Self {
            char_width,
            line_height,
        }
    }

    pub fn estimate(&self, text: &str) -> Size {
        Size::new(
            text.width() as f64 * self.char_width,
            self.line_height,
        )
    }
}

impl TextMeasure for HeuristicMeasure {
    fn measure(&self, text: &str) -> Option<Size> {
        Some(self.estimate(text))
    }
}

/// Measure with `measure`, falling back to `fallback` on failure.
///
/// Non-finite or negative results count as failures.
pub fn measure_or_estimate(
    measure: &dyn TextMeasure,
    fallback: &HeuristicMeasure,
    text: &str,
) -> Size {
    match measure.measure(text) {
        Some(size) if usable(size) => size,
        other => {
            scrolly_core::warn!(text, measured = ?other, "text measurement failed, estimating");
            fallback.estimate(text)
        }
    }
}

fn usable(size: Size) -> bool {
    size.width.is_finite() && size.height.is_finite() && size.width >= 0.0 && size.height >= 0.0
}

/// Shorten `text` with a trailing `...` so it fits in `max_width`.
///
/// Returns the text unchanged if it already fits, and a bare `...` if not even
/// one character fits beside the ellipsis.
pub fn truncate_to_width(
    text: &str,
    max_width: f64,
    width_of: impl Fn(&str) -> f64,
) -> String {
    if text.is_empty() {
        return String::new();
    }
    if width_of(text) <= max_width {
        return text.to_owned();
    }
    let available = max_width - width_of(ELLIPSIS);
    if available <= 0.0 {
        return ELLIPSIS.to_owned();
    }

    let boundaries: Vec<usize> = text
        .grapheme_indices(true)
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    // Longest prefix (in graphemes) whose width fits.
    let (mut lo, mut hi) = (0usize, boundaries.len() - 1);
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if width_of(&text[..boundaries[mid]]) <= available {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    if lo == 0 {
        ELLIPSIS.to_owned()
    } else {
        format!("{}{ELLIPSIS}", &text[..boundaries[lo]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic_width(s: &str) -> f64 {
        HeuristicMeasure::default().estimate(s).width
    }

    #[test]
    fn heuristic_is_8_by_14() {
        assert_eq!(
            HeuristicMeasure::default().estimate("Japan"),
            Size::new(40.0, 14.0)
        );
    }

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(heuristic_width("東京"), 32.0);
        assert_eq!(heuristic_width("Tokyo 東京"), 80.0);
    }

    #[test]
    fn failed_measurement_falls_back() {
        let broken = |_: &str| -> Option<Size> { None };
        let nan = |_: &str| Some(Size::new(f64::NAN, 12.0));
        let fallback = HeuristicMeasure::default();
        assert_eq!(measure_or_estimate(&broken, &fallback, "abc").width, 24.0);
        assert_eq!(measure_or_estimate(&nan, &fallback, "abc").width, 24.0);

        let real = |s: &str| Some(Size::new(s.len() as f64 * 6.5, 12.0));
        assert_eq!(measure_or_estimate(&real, &fallback, "ab").width, 13.0);
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_to_width("Kenya", 100.0, heuristic_width), "Kenya");
        // 80px leaves 56px beside the ellipsis: 7 chars.
        assert_eq!(
            truncate_to_width("South Africa", 80.0, heuristic_width),
            "South A..."
        );
        assert_eq!(truncate_to_width("Botswana", 20.0, heuristic_width), "...");
        assert_eq!(truncate_to_width("Botswana", 30.0, heuristic_width), "...");
        assert_eq!(truncate_to_width("", 0.0, heuristic_width), "");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let out = truncate_to_width("Côte d'Ivoire", 64.0, heuristic_width);
        assert_eq!(out, "Côte ...");
    }

    #[test]
    fn truncation_keeps_combining_marks_whole() {
        // "e" + U+0301 is one grapheme and one column.
        let out = truncate_to_width("Re\u{301}union Island", 56.0, heuristic_width);
        assert_eq!(out, "Re\u{301}un...");
    }
}
