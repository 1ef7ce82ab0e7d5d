#![forbid(unsafe_code)]

//! Content handlers: the state behind the chart, map and image regions.
//!
//! Each handler listens to its bus topics, keeps what its renderer needs to
//! draw, and embeds a [`Presence`] for visibility and placement. Drawing
//! itself happens outside this crate; renderers read the handler state after
//! each [`ContentHandler::tick`].

use std::time::Duration;

use scrolly_core::geometry::{Point, Rect, Size};
use scrolly_layout::composite::CellSize;
use scrolly_layout::{CompositeLayout, LayoutError, LayoutGeometry, LayoutKind, compute_geometry};
use tracing::{debug, warn};

use crate::bus::{Message, Topic};
use crate::config::{AnimationSettings, CitySpec, ImageSpec, LayoutSettings, MapSettings, MapSpec};
use crate::map_view::{MapViewDriver, Projection, ProjectionViewState, SettleAction};
use crate::presence::{Positioned, Presence};
use crate::resolve::ChartUpdate;

/// A bus consumer driving one content region.
pub trait ContentHandler: Positioned {
    /// Topics this handler wants.
    fn topics(&self) -> &'static [Topic];

    fn handle(&mut self, message: &Message);

    /// Advance animations by `dt`.
    fn tick(&mut self, dt: Duration) {
        self.presence_mut().tick(dt);
    }
}

// ---------------------------------------------------------------------------
// Chart
// ---------------------------------------------------------------------------

/// Holds the latest chart update and lays it out.
#[derive(Debug, Clone)]
pub struct ChartHandler {
    presence: Presence,
    layout: LayoutSettings,
    current: Option<ChartUpdate>,
}

impl ChartHandler {
    pub fn new(layout: LayoutSettings, animation: &AnimationSettings) -> Self {
        Self {
            presence: Presence::new(animation.fade()),
            layout,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&ChartUpdate> {
        self.current.as_ref()
    }

    /// Geometry of every chart in the current update, laid out in `viewport`.
    ///
    /// Empty while nothing is shown.
    pub fn geometries(&self, viewport: Rect) -> Result<Vec<LayoutGeometry>, LayoutError> {
        let Some(update) = self.current.as_ref().filter(|u| u.visible) else {
            return Ok(Vec::new());
        };
        let region = self.presence.region(viewport, viewport.size());
        let settings = &self.layout;

        match update.layout {
            LayoutKind::Single => Ok(vec![compute_geometry(
                region.size(),
                &settings.margin,
                settings.aspect_ratio,
                &settings.limits,
            )?]),
            kind => {
                let (count, sizes): (usize, Vec<CellSize>) = match kind {
                    LayoutKind::Grid => (update.cells.len(), Vec::new()),
                    _ => (update.charts.len(), update.charts.iter().map(|c| c.size).collect()),
                };
                CompositeLayout::new(kind)
                    .arrangement(settings.arrangement)
                    .gap(settings.gap(kind))
                    .geometries(
                        region,
                        &sizes,
                        count,
                        &settings.margin,
                        settings.aspect_ratio,
                        &settings.limits,
                    )
            }
        }
    }
}

impl Positioned for ChartHandler {
    fn presence(&self) -> &Presence {
        &self.presence
    }

    fn presence_mut(&mut self) -> &mut Presence {
        &mut self.presence
    }
}

impl ContentHandler for ChartHandler {
    fn topics(&self) -> &'static [Topic] {
        &[Topic::Chart]
    }

    fn handle(&mut self, message: &Message) {
        let Message::Chart(update) = message else {
            return;
        };
        if update.visible {
            self.apply_placement(update.position.as_ref());
            self.show();
            if let Some(err) = &update.error {
                warn!(%err, "chart region shows error placeholder");
            }
        } else {
            self.hide();
        }
        self.current = Some(update.clone());
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Camera, highlights and city markers of the map region.
#[derive(Debug, Clone)]
pub struct MapHandler {
    presence: Presence,
    driver: MapViewDriver,
    settings: MapSettings,
    animation: AnimationSettings,
    viewport: Size,
    spec: Option<MapSpec>,
    highlighted: Vec<String>,
    markers: Vec<CitySpec>,
    projected: Vec<(String, Point)>,
    timeline_progress: Option<f64>,
}

impl MapHandler {
    pub fn new(settings: MapSettings, animation: AnimationSettings, viewport: Size) -> Self {
        let initial = ProjectionViewState::from_zoom(settings.center, settings.zoom, settings.scale_per_zoom);
        let driver = MapViewDriver::new(initial)
            .easing(animation.map_easing)
            .settle_delay(animation.map_settle_delay());
        Self {
            presence: Presence::new(animation.fade()),
            driver,
            settings,
            animation,
            viewport,
            spec: None,
            highlighted: Vec::new(),
            markers: Vec::new(),
            projected: Vec::new(),
            timeline_progress: None,
        }
    }

    pub fn camera(&self) -> ProjectionViewState {
        self.driver.current()
    }

    /// Map config of the current step.
    pub fn spec(&self) -> Option<&MapSpec> {
        self.spec.as_ref()
    }

    pub fn is_moving(&self) -> bool {
        self.driver.is_animating()
    }

    pub fn highlighted(&self) -> &[String] {
        &self.highlighted
    }

    /// Markers currently on the map.
    ///
    /// In a cities timeline only the first `ceil(progress * n)` are shown.
    pub fn markers(&self) -> &[CitySpec] {
        match self.timeline_progress {
            Some(progress) => {
                let shown = (progress * self.markers.len() as f64).ceil() as usize;
                &self.markers[..shown.min(self.markers.len())]
            }
            None => &self.markers,
        }
    }

    /// Screen positions of the shown markers as of the last frame.
    pub fn projected_markers(&self) -> &[(String, Point)] {
        let shown = self.markers().len();
        &self.projected[..shown.min(self.projected.len())]
    }

    /// New viewport size; re-projects markers.
    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.reproject();
    }

    fn reproject(&mut self) {
        let projection = Projection::new(self.driver.current(), self.viewport);
        self.projected = self
            .markers
            .iter()
            .map(|c| (c.name.clone(), projection.project(c.coordinates)))
            .collect();
    }

    fn target_for(&self, spec: &MapSpec) -> ProjectionViewState {
        ProjectionViewState::from_zoom(
            spec.center.unwrap_or(self.settings.center),
            spec.zoom.unwrap_or(self.settings.zoom),
            self.settings.scale_per_zoom,
        )
    }

    fn settle_actions(spec: &MapSpec) -> Vec<SettleAction> {
        let mut actions = Vec::new();
        if !spec.highlight_countries.is_empty() {
            actions.push(SettleAction::HighlightCountries(spec.highlight_countries.clone()));
        }
        if !spec.cities.is_empty() {
            actions.push(SettleAction::ShowMarkers(spec.cities.clone()));
        }
        if let Some(focus) = &spec.focus {
            match spec.cities.iter().find(|c| &c.name == focus) {
                Some(city) => actions.push(SettleAction::FocusCity(city.clone())),
                None => warn!(city = %focus, "focus city not among map cities"),
            }
        }
        actions
    }

    fn apply(&mut self, action: SettleAction) {
        match action {
            SettleAction::HighlightCountries(countries) => self.highlighted = countries,
            SettleAction::ShowMarkers(cities) => {
                self.markers = cities;
                self.reproject();
            }
            SettleAction::FocusCity(city) => {
                debug!(city = %city.name, "focusing city");
                let target = ProjectionViewState::new(city.coordinates, self.settings.city_focus_scale);
                self.driver.animate_view(
                    target,
                    Duration::from_millis(self.animation.city_focus_ms),
                    Vec::new(),
                );
            }
        }
    }

    fn show_map(&mut self, spec: &MapSpec) {
        let was_visible = self.is_visible();
        self.apply_placement(spec.position.as_ref());
        self.show();

        // Markers from the previous step go before the camera moves.
        self.markers.clear();
        self.projected.clear();
        self.highlighted.clear();
        self.timeline_progress = spec.is_cities_timeline().then_some(0.0);

        let target = self.target_for(spec);
        let actions = Self::settle_actions(spec);
        if was_visible {
            self.driver
                .animate_view(target, self.animation.map_transition(), actions);
        } else {
            self.driver.jump_to(target);
            for action in actions {
                self.apply(action);
            }
        }
        self.spec = Some(spec.clone());
    }
}

impl Positioned for MapHandler {
    fn presence(&self) -> &Presence {
        &self.presence
    }

    fn presence_mut(&mut self) -> &mut Presence {
        &mut self.presence
    }
}

impl ContentHandler for MapHandler {
    fn topics(&self) -> &'static [Topic] {
        &[Topic::Map, Topic::MapProgress]
    }

    fn handle(&mut self, message: &Message) {
        match message {
            Message::Map(spec) if spec.is_visible() => self.show_map(spec),
            Message::Map(_) => {
                self.hide();
                self.driver.cancel();
                self.markers.clear();
                self.projected.clear();
                self.spec = None;
            }
            Message::MapProgress { progress, .. } => {
                if self.timeline_progress.is_some() {
                    self.timeline_progress = Some(progress.clamp(0.0, 1.0));
                }
            }
            _ => {}
        }
    }

    fn tick(&mut self, dt: Duration) {
        self.presence.tick(dt);
        if let Some(frame) = self.driver.tick(dt) {
            self.reproject();
            for action in frame.settled {
                self.apply(action);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// The image region.
#[derive(Debug, Clone, Default)]
pub struct ImageHandler {
    presence: Presence,
    current: Option<ImageSpec>,
}

impl ImageHandler {
    pub fn new(animation: &AnimationSettings) -> Self {
        Self {
            presence: Presence::new(animation.fade()),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&ImageSpec> {
        self.current.as_ref()
    }
}

impl Positioned for ImageHandler {
    fn presence(&self) -> &Presence {
        &self.presence
    }

    fn presence_mut(&mut self) -> &mut Presence {
        &mut self.presence
    }
}

impl ContentHandler for ImageHandler {
    fn topics(&self) -> &'static [Topic] {
        &[Topic::Image]
    }

    fn handle(&mut self, message: &Message) {
        let Message::Image(spec) = message else {
            return;
        };
        if spec.is_visible() && !spec.src.is_empty() {
            self.apply_placement(spec.position.as_ref());
            self.show();
            self.current = Some(spec.clone());
        } else {
            self.hide();
            self.current = None;
        }
    }
}
