#![forbid(unsafe_code)]

//! Story configuration.
//!
//! One [`StoryConfig`] is loaded at startup, validated once, and then passed
//! by reference to every component that needs a default. Nothing reads
//! configuration from ambient state.
//!
//! The JSON shape follows the presentation's config files: camelCase keys,
//! every section optional.
//!
//! ```json
//! {
//!   "activeProfile": "aids",
//!   "profiles": { "aids": { "dynamicCounts": { "city-episodes": 7 } } },
//!   "steps": [
//!     { "id": "opening", "chart": { "type": "line", "dataFile": "global.csv" } },
//!     { "id": "city-episodes", "dynamic": true,
//!       "map": { "mode": "cities-timeline", "zoom": 2 } },
//!     { "id": "footer" }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use scrolly_core::animation::Easing;
use scrolly_layout::composite::CellSize;
use scrolly_layout::{Arrangement, LabelConfig, LayoutError, LayoutKind, MarginSpec, SizeLimits};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::presence::Placement;

/// How a chart moves from its previous state to the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Redraw from scratch.
    #[default]
    Replace,
    /// Animate from the current drawing.
    Transition,
}

/// Root of a loaded story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryConfig {
    pub steps: Vec<StepContent>,
    pub profiles: BTreeMap<String, ProfileConfig>,
    pub active_profile: Option<String>,
    pub animation: AnimationSettings,
    pub map: MapSettings,
    pub labels: LabelConfig,
    pub layout: LayoutSettings,
}

/// Per-dataset settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileConfig {
    /// Instance count for each dynamic step group.
    pub dynamic_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationSettings {
    pub chart_transition_ms: u64,
    pub map_transition_ms: u64,
    /// Pause between the camera settling and highlights appearing.
    pub map_settle_delay_ms: u64,
    pub map_easing: Easing,
    pub city_focus_ms: u64,
    pub fade_ms: u64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            chart_transition_ms: 1000,
            map_transition_ms: 1500,
            map_settle_delay_ms: 200,
            map_easing: Easing::EaseInOutCubic,
            city_focus_ms: 1000,
            fade_ms: 300,
        }
    }
}

impl AnimationSettings {
    pub fn chart_transition(&self) -> Duration {
        Duration::from_millis(self.chart_transition_ms)
    }

    pub fn map_transition(&self) -> Duration {
        Duration::from_millis(self.map_transition_ms)
    }

    pub fn map_settle_delay(&self) -> Duration {
        Duration::from_millis(self.map_settle_delay_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapSettings {
    /// Projection scale per unit of `zoom`.
    pub scale_per_zoom: f64,
    /// Projection scale when focusing a single city.
    pub city_focus_scale: f64,
    /// Initial camera.
    pub center: [f64; 2],
    pub zoom: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            scale_per_zoom: 150.0,
            city_focus_scale: 300.0,
            center: [0.0, 20.0],
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSettings {
    pub limits: SizeLimits,
    pub margin: MarginSpec,
    pub dual_gap: f64,
    pub triple_gap: f64,
    pub grid_gap: f64,
    pub arrangement: Arrangement,
    pub aspect_ratio: Option<f64>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            limits: SizeLimits::default(),
            margin: MarginSpec::default(),
            dual_gap: LayoutKind::Dual.default_gap(),
            triple_gap: LayoutKind::Triple.default_gap(),
            grid_gap: LayoutKind::Grid.default_gap(),
            arrangement: Arrangement::default(),
            aspect_ratio: None,
        }
    }
}

impl LayoutSettings {
    /// Configured gap between cells of `kind`.
    pub fn gap(&self, kind: LayoutKind) -> f64 {
        match kind {
            LayoutKind::Single => 0.0,
            LayoutKind::Dual => self.dual_gap,
            LayoutKind::Triple => self.triple_gap,
            LayoutKind::Grid => self.grid_gap,
        }
    }
}

/// What one step shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StepContent {
    /// Logical step name; for a dynamic group, the group name.
    pub id: String,
    /// Expands to one step per instance of the active profile's count.
    pub dynamic: bool,
    pub chart: Option<ChartSpec>,
    pub map: Option<MapSpec>,
    pub image: Option<ImageSpec>,
}

/// Chart section of a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: Option<String>,
    pub data_file: Option<String>,
    pub update_mode: Option<UpdateMode>,
    /// Kept as text so an unknown value surfaces at resolution time.
    pub layout: Option<String>,
    pub charts: Vec<SubChartSpec>,
    pub config: Map<String, Value>,
    pub visible: Option<bool>,
    pub position: Option<Placement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChartSpec {
    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    /// Declared layout; `single` when none is given.
    pub fn layout_kind(&self) -> Result<LayoutKind, LayoutError> {
        self.layout.as_deref().map_or(Ok(LayoutKind::Single), str::parse)
    }

    /// Data file for charts whose data comes from `config.dataFile` (grid).
    pub fn config_data_file(&self) -> Option<&str> {
        self.config.get("dataFile").and_then(Value::as_str)
    }
}

/// One chart of a dual or triple composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubChartSpec {
    #[serde(rename = "type")]
    pub chart_type: Option<String>,
    pub data_file: Option<String>,
    pub size: CellSize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Map section of a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapSpec {
    /// `[lon, lat]`.
    pub center: Option<[f64; 2]>,
    pub zoom: Option<f64>,
    pub highlight_countries: Vec<String>,
    pub cities: Vec<CitySpec>,
    pub mode: Option<String>,
    /// City to fly to after the camera settles.
    pub focus: Option<String>,
    pub visible: Option<bool>,
    pub position: Option<Placement>,
}

impl MapSpec {
    pub const CITIES_TIMELINE: &'static str = "cities-timeline";

    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    pub fn is_cities_timeline(&self) -> bool {
        self.mode.as_deref() == Some(Self::CITIES_TIMELINE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitySpec {
    pub name: String,
    /// `[lon, lat]`.
    pub coordinates: [f64; 2],
}

/// Image section of a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSpec {
    pub src: String,
    pub alt: Option<String>,
    pub visible: Option<bool>,
    pub position: Option<Placement>,
}

impl ImageSpec {
    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }
}

/// A story that failed to load or validate.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid {
        field: String,
        value: String,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, value: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "story config parse error: {err}"),
            Self::Invalid {
                field,
                value,
                message,
            } => write!(f, "{field}={value}: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

impl StoryConfig {
    /// Parse a story from JSON. Missing sections take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Content for the step with logical name `id`.
    pub fn step(&self, id: &str) -> Option<&StepContent> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Step declared after `id`, in file order.
    pub fn step_after(&self, id: &str) -> Option<&StepContent> {
        let pos = self.steps.iter().position(|s| s.id == id)?;
        self.steps.get(pos + 1)
    }

    /// Count of `group` in the active profile.
    pub fn dynamic_count(&self, group: &str) -> Option<usize> {
        let profile = self.active_profile.as_ref()?;
        self.profiles.get(profile)?.dynamic_counts.get(group).copied()
    }

    /// Check the whole story and return every violation found.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        let mut seen = BTreeSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            if step.id.trim().is_empty() {
                errors.push(ConfigError::invalid(format!("steps[{i}].id"), "\"\"", "empty step id"));
            } else if !seen.insert(step.id.as_str()) {
                errors.push(ConfigError::invalid(format!("steps[{i}].id"), &step.id, "duplicate step id"));
            }
            if step.dynamic && self.dynamic_count(&step.id).is_none() {
                errors.push(ConfigError::invalid(
                    format!("steps[{i}].dynamic"),
                    &step.id,
                    format!(
                        "no count in active profile {}",
                        self.active_profile.as_deref().unwrap_or("<none>")
                    ),
                ));
            }
            if let Some(chart) = &step.chart {
                validate_chart(i, chart, &mut errors);
            }
        }

        if let Some(profile) = &self.active_profile
            && !self.profiles.contains_key(profile)
        {
            errors.push(ConfigError::invalid("activeProfile", profile, "unknown profile"));
        }

        let anim = &self.animation;
        for (field, ms) in [
            ("animation.chartTransitionMs", anim.chart_transition_ms),
            ("animation.mapTransitionMs", anim.map_transition_ms),
            ("animation.cityFocusMs", anim.city_focus_ms),
        ] {
            if ms == 0 {
                errors.push(ConfigError::invalid(field, ms, "duration must be positive"));
            }
        }

        if !(self.map.scale_per_zoom > 0.0 && self.map.scale_per_zoom.is_finite()) {
            errors.push(ConfigError::invalid("map.scalePerZoom", self.map.scale_per_zoom, "must be positive"));
        }
        if !(self.map.city_focus_scale > 0.0 && self.map.city_focus_scale.is_finite()) {
            errors.push(ConfigError::invalid(
                "map.cityFocusScale",
                self.map.city_focus_scale,
                "must be positive",
            ));
        }

        if let Err(err) = self.layout.limits.validate() {
            errors.push(ConfigError::invalid("layout.limits", format_args!("{:?}", self.layout.limits), err.to_string()));
        }
        if let Some(ratio) = self.layout.aspect_ratio
            && !(ratio > 0.0 && ratio.is_finite())
        {
            errors.push(ConfigError::invalid("layout.aspectRatio", ratio, "must be positive"));
        }
        for (field, gap) in [
            ("layout.dualGap", self.layout.dual_gap),
            ("layout.tripleGap", self.layout.triple_gap),
            ("layout.gridGap", self.layout.grid_gap),
        ] {
            if !(gap >= 0.0 && gap.is_finite()) {
                errors.push(ConfigError::invalid(field, gap, "must be non-negative"));
            }
        }

        if let Err(label_errors) = self.labels.validate() {
            errors.extend(label_errors.into_iter().map(|err| match err {
                LayoutError::InvalidConfig { field, message } => {
                    ConfigError::invalid(field, "", message)
                }
                other => ConfigError::invalid("labels", "", other.to_string()),
            }));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn validate_chart(i: usize, chart: &ChartSpec, errors: &mut Vec<ConfigError>) {
    let field = format!("steps[{i}].chart.layout");
    match chart.layout_kind() {
        Err(err) => errors.push(ConfigError::invalid(
            field,
            chart.layout.as_deref().unwrap_or_default(),
            err.to_string(),
        )),
        Ok(kind @ (LayoutKind::Dual | LayoutKind::Triple)) => {
            if let Err(err) = kind.check_count(chart.charts.len()) {
                errors.push(ConfigError::invalid(field, kind, err.to_string()));
            }
        }
        Ok(_) => {}
    }
}
