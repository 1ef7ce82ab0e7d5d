#![forbid(unsafe_code)]

//! Step content resolution.
//!
//! Turns a step's [`ChartSpec`] plus the scroll direction into a
//! [`ChartUpdate`] ready for the chart renderer:
//!
//! - the update mode, with the backward lookahead rule applied
//! - the layout dispatch (`single`, `dual`, `triple`, `grid`)
//! - data looked up through a [`DataSource`]
//! - the step's chart config deep-merged over the story defaults
//!
//! Resolution is pure. Publishing the result is the session's job.

use std::collections::BTreeMap;
use std::fmt;

use scrolly_core::event::Direction;
use scrolly_layout::composite::CellSize;
use scrolly_layout::{LayoutError, LayoutKind};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

pub use crate::config::UpdateMode;
use crate::config::{ChartSpec, StoryConfig, SubChartSpec};
use crate::presence::Placement;

/// Chart type the grid layout loads its shared data as.
const GRID_DATA_TYPE: &str = "pie";

/// Where chart data comes from.
///
/// The host loads and parses data files; resolution only asks for them.
pub trait DataSource {
    /// Data for a chart of `chart_type` backed by `data_file`.
    fn chart_data(&self, chart_type: Option<&str>, data_file: &str) -> Option<Value>;
}

impl<F> DataSource for F
where
    F: Fn(Option<&str>, &str) -> Option<Value>,
{
    fn chart_data(&self, chart_type: Option<&str>, data_file: &str) -> Option<Value> {
        self(chart_type, data_file)
    }
}

/// Preloaded data keyed by file name.
impl DataSource for BTreeMap<String, Value> {
    fn chart_data(&self, _chart_type: Option<&str>, data_file: &str) -> Option<Value> {
        self.get(data_file).cloned()
    }
}

/// A chart could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// Unknown layout or wrong number of charts.
    Layout(LayoutError),
    /// The data source has nothing for this file.
    MissingData { data_file: String },
    /// A chart that needs data declares no data file.
    MissingDataFile,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(err) => write!(f, "{err}"),
            Self::MissingData { data_file } => write!(f, "no data for '{data_file}'"),
            Self::MissingDataFile => write!(f, "chart declares no data file"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LayoutError> for ResolveError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

/// One chart of a dual or triple update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedChart {
    #[serde(rename = "type")]
    pub chart_type: Option<String>,
    pub data_file: Option<String>,
    pub size: CellSize,
    pub data: Option<Value>,
    /// Set when this slot renders an error placeholder instead of data.
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolvedChart {
    fn from_spec(spec: &SubChartSpec, data: Result<Value, ResolveError>) -> Self {
        let (data, error) = match data {
            Ok(data) => (Some(data), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            chart_type: spec.chart_type.clone(),
            data_file: spec.data_file.clone(),
            size: spec.size,
            data,
            error,
            extra: spec.extra.clone(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// Message for the chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartUpdate {
    pub visible: bool,
    pub layout: LayoutKind,
    #[serde(rename = "type")]
    pub chart_type: Option<String>,
    pub data_file: Option<String>,
    pub update_mode: UpdateMode,
    pub direction: Direction,
    pub data: Option<Value>,
    /// Dual / triple sub-charts, in declared order.
    pub charts: Vec<ResolvedChart>,
    /// Grid cells, one data slice each.
    pub cells: Vec<Value>,
    pub config: Map<String, Value>,
    pub position: Option<Placement>,
    /// Set when the whole region renders an error placeholder.
    pub error: Option<String>,
}

impl ChartUpdate {
    fn empty(direction: Direction) -> Self {
        Self {
            visible: true,
            layout: LayoutKind::Single,
            chart_type: None,
            data_file: None,
            update_mode: UpdateMode::Replace,
            direction,
            data: None,
            charts: Vec::new(),
            cells: Vec::new(),
            config: Map::new(),
            position: None,
            error: None,
        }
    }

    /// Hide the chart region and draw nothing.
    pub fn hidden(direction: Direction) -> Self {
        Self {
            visible: false,
            ..Self::empty(direction)
        }
    }

    /// Placeholder shown in place of a chart that failed to resolve.
    pub fn error_state(spec: &ChartSpec, direction: Direction, err: &ResolveError) -> Self {
        Self {
            layout: spec.layout_kind().unwrap_or_default(),
            chart_type: spec.chart_type.clone(),
            data_file: spec.data_file.clone(),
            position: spec.position,
            error: Some(err.to_string()),
            ..Self::empty(direction)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Merge `overlay` into `base`. Objects merge key by key; anything else in
/// `overlay` replaces the value in `base`.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => merge_maps(base, overlay),
        (base, overlay) => *base = overlay.clone(),
    }
}

fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Update mode for `spec`, given the step after it.
///
/// Scrolling up into a step whose successor transitions from the same data
/// file transitions too, so the reverse of an animation is an animation.
pub fn decide_update_mode(spec: &ChartSpec, next: Option<&ChartSpec>, direction: Direction) -> UpdateMode {
    let declared = spec.update_mode.unwrap_or_default();
    if !direction.is_backward() {
        return declared;
    }
    match next {
        Some(next)
            if next.data_file == spec.data_file
                && next.update_mode == Some(UpdateMode::Transition) =>
        {
            UpdateMode::Transition
        }
        _ => declared,
    }
}

/// Resolves chart specs against the story's chart defaults.
#[derive(Debug, Clone, Default)]
pub struct ChartResolver {
    defaults: Map<String, Value>,
}

impl ChartResolver {
    pub fn new(defaults: Map<String, Value>) -> Self {
        Self { defaults }
    }

    /// Defaults taken from a loaded story.
    pub fn from_config(config: &StoryConfig) -> Self {
        let defaults = json!({
            "transitionDuration": config.animation.chart_transition_ms,
            "margin": config.layout.margin,
            "labels": config.labels,
        });
        match defaults {
            Value::Object(map) => Self::new(map),
            _ => Self::default(),
        }
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    /// Resolve one step's chart.
    ///
    /// `next` is the chart of the step after this one in forward order.
    pub fn resolve(
        &self,
        spec: &ChartSpec,
        next: Option<&ChartSpec>,
        direction: Direction,
        source: &dyn DataSource,
    ) -> Result<ChartUpdate, ResolveError> {
        if !spec.is_visible() {
            return Ok(ChartUpdate::hidden(direction));
        }

        let layout = spec.layout_kind()?;
        let mut update = ChartUpdate {
            layout,
            chart_type: spec.chart_type.clone(),
            data_file: spec.data_file.clone(),
            update_mode: decide_update_mode(spec, next, direction),
            config: self.merged_config(spec),
            position: spec.position,
            ..ChartUpdate::empty(direction)
        };

        match layout {
            LayoutKind::Single => {
                if let Some(file) = &spec.data_file {
                    update.data = Some(load(source, spec.chart_type.as_deref(), file)?);
                }
            }
            LayoutKind::Dual | LayoutKind::Triple => {
                layout.check_count(spec.charts.len())?;
                update.charts = spec
                    .charts
                    .iter()
                    .map(|sub| {
                        let data = sub
                            .data_file
                            .as_deref()
                            .ok_or(ResolveError::MissingDataFile)
                            .and_then(|file| load(source, sub.chart_type.as_deref(), file));
                        if let Err(err) = &data {
                            warn!(%err, layout = %layout, "sub-chart renders placeholder");
                        }
                        ResolvedChart::from_spec(sub, data)
                    })
                    .collect();
            }
            LayoutKind::Grid => {
                let file = spec
                    .config_data_file()
                    .or(spec.data_file.as_deref())
                    .ok_or(ResolveError::MissingDataFile)?;
                let chart_type = spec.chart_type.as_deref().or(Some(GRID_DATA_TYPE));
                let data = load(source, chart_type, file)?;
                update.cells = fan_out(&data);
                layout.check_count(update.cells.len())?;
                update.data_file = Some(file.to_owned());
                update.data = Some(data);
            }
        }

        debug!(
            layout = %update.layout,
            mode = ?update.update_mode,
            direction = %direction,
            "chart resolved"
        );
        Ok(update)
    }

    fn merged_config(&self, spec: &ChartSpec) -> Map<String, Value> {
        let mut merged = self.defaults.clone();
        merge_maps(&mut merged, &spec.config);
        merged
    }
}

fn load(source: &dyn DataSource, chart_type: Option<&str>, file: &str) -> Result<Value, ResolveError> {
    source
        .chart_data(chart_type, file)
        .ok_or_else(|| ResolveError::MissingData {
            data_file: file.to_owned(),
        })
}

/// Split shared grid data into one slice per cell.
///
/// Arrays give one cell per element; objects one cell per key, as
/// `{"name": key, "data": value}`; anything else is a single cell.
fn fan_out(data: &Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map
            .iter()
            .map(|(name, data)| json!({ "name": name, "data": data }))
            .collect(),
        other => vec![other.clone()],
    }
}
