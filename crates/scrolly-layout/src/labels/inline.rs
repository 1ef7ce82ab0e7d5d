//! From series data to a placed label plan.

use serde::{Deserialize, Serialize};

use super::{Label, LabelConfig, place_labels, place_labels_dual};
use crate::measure::{HeuristicMeasure, TextMeasure, measure_or_estimate, truncate_to_width};
use crate::scale::LinearScale;
use scrolly_core::geometry::Point;

/// One sample of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One line of a multi-line chart. Names are unique within a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<DataPoint>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = DataPoint>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }
}

/// Plot area size, its scales and the viewport it is shown in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartFrame {
    pub width: f64,
    pub height: f64,
    pub x: LinearScale,
    pub y: LinearScale,
    pub viewport_width: f64,
}

/// Ordinal color assignment by series position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette(Vec<String>);

impl Default for Palette {
    fn default() -> Self {
        Self::category10()
    }
}

impl Palette {
    pub fn new(colors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(colors.into_iter().map(Into::into).collect())
    }

    /// The ten-color categorical scheme charts use by default.
    pub fn category10() -> Self {
        Self::new([
            "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
            "#7f7f7f", "#bcbd22", "#17becf",
        ])
    }

    /// Color for the `index`th series, cycling. Empty palettes yield black.
    pub fn color(&self, index: usize) -> &str {
        if self.0.is_empty() {
            "#000000"
        } else {
            &self.0[index % self.0.len()]
        }
    }
}

/// Dashed segment from an anchor to its displaced label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderLine {
    pub from: Point,
    pub to: Point,
    pub color: String,
}

/// Leader lines for labels further than `threshold` from their anchor.
pub fn leader_lines(labels: &[Label], threshold: f64) -> Vec<LeaderLine> {
    labels
        .iter()
        .filter(|l| l.needs_leader(threshold))
        .map(|l| LeaderLine {
            from: l.anchor,
            to: l.position(),
            color: l.color.clone(),
        })
        .collect()
}

/// Swatch legend entry used instead of inline labels on narrow viewports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub name: String,
    pub color: String,
}

/// What the chart should draw for its series names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LabelPlan {
    /// Fewer than two labelable series.
    None,
    #[serde(rename_all = "camelCase")]
    Inline {
        labels: Vec<Label>,
        leader_lines: Vec<LeaderLine>,
    },
    Legend { entries: Vec<LegendEntry> },
}

/// Builds label plans from series data.
pub struct InlineLabeler<'a> {
    config: &'a LabelConfig,
    measure: &'a dyn TextMeasure,
    palette: Palette,
}

struct Endpoint<'s> {
    name: &'s str,
    anchor: Point,
    color: String,
}

impl<'a> InlineLabeler<'a> {
    pub fn new(config: &'a LabelConfig, measure: &'a dyn TextMeasure) -> Self {
        Self {
            config,
            measure,
            palette: Palette::default(),
        }
    }

    #[must_use]
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Plan labels for a full-width chart.
    pub fn plan(&self, series: &[Series], frame: &ChartFrame) -> LabelPlan {
        let endpoints = self.endpoints(series, frame);
        if endpoints.len() < 2 {
            return LabelPlan::None;
        }
        if frame.viewport_width < self.config.responsive_threshold {
            scrolly_core::debug!(
                viewport = frame.viewport_width,
                "viewport below threshold, using legend"
            );
            return LabelPlan::Legend {
                entries: endpoints
                    .into_iter()
                    .map(|e| LegendEntry {
                        name: e.name.to_owned(),
                        color: e.color,
                    })
                    .collect(),
            };
        }

        let config = self.config;
        let fallback = HeuristicMeasure::default();
        let max_width = frame.width * config.max_label_width_ratio;
        let right_limit = frame.width + config.max_extension;
        let mut labels = self.build_labels(endpoints, &fallback, max_width, |anchor, width| {
            (anchor.x + config.offset_x).min(right_limit - width - 5.0)
        });

        place_labels(&mut labels, frame.width, frame.height, config);
        let leader_lines = if config.leader_lines {
            leader_lines(&labels, config.leader_threshold)
        } else {
            Vec::new()
        };
        LabelPlan::Inline {
            labels,
            leader_lines,
        }
    }

    /// Plan labels for one chart of a side-by-side pair.
    pub fn plan_dual(&self, series: &[Series], frame: &ChartFrame) -> LabelPlan {
        let endpoints = self.endpoints(series, frame);
        if endpoints.len() < 2 {
            return LabelPlan::None;
        }

        let dual = &self.config.dual;
        let fallback = HeuristicMeasure::new(dual.fallback_char_width, dual.fallback_line_height);
        let max_width = frame.width * dual.max_label_width_ratio;
        let right_limit = frame.width + dual.max_extension;
        let mut labels = self.build_labels(endpoints, &fallback, max_width, |anchor, width| {
            (anchor.x + dual.offset_x).min(right_limit - width - 3.0)
        });

        place_labels_dual(&mut labels, frame.width, frame.height, dual);
        LabelPlan::Inline {
            labels,
            leader_lines: Vec::new(),
        }
    }

    fn endpoints<'s>(&self, series: &'s [Series], frame: &ChartFrame) -> Vec<Endpoint<'s>> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::with_capacity(series.len());
        for (index, s) in series.iter().enumerate() {
            let Some(last) = s.values.last() else {
                scrolly_core::warn!(series = %s.name, "series has no values, no label");
                continue;
            };
            if !seen.insert(s.name.as_str()) {
                scrolly_core::warn!(series = %s.name, "duplicate series name, no label");
                continue;
            }
            let anchor = Point::new(frame.x.apply(last.x), frame.y.apply(last.y));
            if !anchor.is_finite() {
                scrolly_core::warn!(series = %s.name, "series end point is not finite, no label");
                continue;
            }
            out.push(Endpoint {
                name: &s.name,
                anchor,
                color: self.palette.color(index).to_owned(),
            });
        }
        out
    }

    fn build_labels(
        &self,
        endpoints: Vec<Endpoint<'_>>,
        fallback: &HeuristicMeasure,
        max_width: f64,
        initial_x: impl Fn(Point, f64) -> f64,
    ) -> Vec<Label> {
        endpoints
            .into_iter()
            .map(|e| {
                let text = truncate_to_width(e.name, max_width, |s| {
                    measure_or_estimate(self.measure, fallback, s).width
                });
                let size = measure_or_estimate(self.measure, fallback, &text);
                let mut label = Label::new(e.anchor, size, text)
                    .with_full_text(e.name)
                    .with_color(e.color);
                label.x = initial_x(e.anchor, size.width);
                label
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelStrategy;
    use scrolly_core::geometry::Size;

    fn frame(viewport_width: f64) -> ChartFrame {
        ChartFrame {
            width: 600.0,
            height: 400.0,
            x: LinearScale::new((2000.0, 2020.0), (0.0, 600.0)),
            y: LinearScale::new((0.0, 100.0), (400.0, 0.0)),
            viewport_width,
        }
    }

    fn series(name: &str, last: f64) -> Series {
        Series::new(
            name,
            [DataPoint::new(2000.0, 10.0), DataPoint::new(2020.0, last)],
        )
    }

    #[test]
    fn single_series_gets_no_labels() {
        let config = LabelConfig::default();
        let measure = HeuristicMeasure::default();
        let labeler = InlineLabeler::new(&config, &measure);
        assert_eq!(labeler.plan(&[series("a", 50.0)], &frame(1200.0)), LabelPlan::None);
        let with_empty = [series("a", 50.0), Series::new("b", [])];
        assert_eq!(labeler.plan(&with_empty, &frame(1200.0)), LabelPlan::None);
    }

    #[test]
    fn narrow_viewport_falls_back_to_legend() {
        let config = LabelConfig::default();
        let measure = HeuristicMeasure::default();
        let labeler = InlineLabeler::new(&config, &measure);
        let plan = labeler.plan(&[series("a", 50.0), series("b", 60.0)], &frame(480.0));
        let LabelPlan::Legend { entries } = plan else {
            panic!("expected legend, got {plan:?}");
        };
        assert_eq!(entries[0].name, "a");
        assert_eq!(entries[1].color, "#ff7f0e");
    }

    #[test]
    fn inline_labels_are_stacked_with_leaders() {
        let config = LabelConfig::default();
        let measure = HeuristicMeasure::default();
        let labeler = InlineLabeler::new(&config, &measure);
        let input = [series("Kenya", 50.0), series("Uganda", 51.0), series("Malawi", 90.0)];
        let LabelPlan::Inline {
            labels,
            leader_lines,
        } = labeler.plan(&input, &frame(1200.0))
        else {
            panic!("expected inline labels");
        };
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].anchor, Point::new(600.0, 200.0));
        assert!(labels.iter().all(|l| l.x == 660.0));
        // Every stacked label moved well away from its anchor.
        assert_eq!(leader_lines.len(), 3);
        assert_eq!(leader_lines[2].color, "#2ca02c");
    }

    #[test]
    fn long_names_are_truncated() {
        let config = LabelConfig::default();
        let measure = HeuristicMeasure::default();
        let labeler = InlineLabeler::new(&config, &measure);
        let input = [
            series("Democratic Republic of the Congo", 50.0),
            series("Chad", 20.0),
        ];
        let LabelPlan::Inline { labels, .. } = labeler.plan(&input, &frame(1200.0)) else {
            panic!("expected inline labels");
        };
        // 0.3 * 600 = 180px: 19 chars + "..."
        assert_eq!(labels[0].text, "Democratic Republic...");
        assert!(labels[0].is_truncated());
        assert_eq!(labels[0].full_text, "Democratic Republic of the Congo");
        assert!(labels[0].width <= 180.0);
        assert!(!labels[1].is_truncated());
    }

    #[test]
    fn refined_strategy_keeps_isolated_labels_near_anchor() {
        let config = LabelConfig {
            strategy: LabelStrategy::Refined,
            ..LabelConfig::default()
        };
        let measure = HeuristicMeasure::default();
        let labeler = InlineLabeler::new(&config, &measure);
        let input = [series("a", 90.0), series("b", 10.0)];
        let LabelPlan::Inline {
            labels,
            leader_lines,
        } = labeler.plan(&input, &frame(1200.0))
        else {
            panic!("expected inline labels");
        };
        assert_eq!(labels[0].y, 40.0);
        assert_eq!(labels[1].y, 360.0);
        // 15px horizontal offset from the anchor.
        assert_eq!(leader_lines.len(), 2);
    }

    #[test]
    fn dual_plan_has_no_leader_lines() {
        let config = LabelConfig::default();
        let failing = |_: &str| -> Option<Size> { None };
        let labeler = InlineLabeler::new(&config, &failing);
        let LabelPlan::Inline {
            labels,
            leader_lines,
        } = labeler.plan_dual(&[series("ab", 50.0), series("cd", 52.0)], &frame(300.0))
        else {
            panic!("expected inline labels");
        };
        assert!(leader_lines.is_empty());
        // Measurement failed: 7px per char, 12px tall.
        assert_eq!(labels[0].width, 14.0);
        assert_eq!(labels[0].height, 12.0);
        assert_eq!(labels[1].y, 200.0 - 8.0 - 60.0);
        assert_eq!(labels[0].y, labels[1].y + 18.0);
    }

    #[test]
    fn palette_cycles() {
        let p = Palette::new(["red", "blue"]);
        assert_eq!(p.color(3), "blue");
        assert_eq!(Palette::new(Vec::<String>::new()).color(0), "#000000");
    }
}
