#![forbid(unsafe_code)]

//! Map camera interpolation.
//!
//! A map camera is a [`ProjectionViewState`]: a `[lon, lat]` center and a
//! projection scale. Moves interpolate those two parameters, never screen
//! coordinates; every frame re-projects whatever sits on the map through a
//! [`Projection`] built from the interpolated state, so shapes stay
//! undistorted mid-flight.
//!
//! [`MapViewDriver`] owns the camera. Starting a move while one is in flight
//! supersedes it: the new move starts from wherever the camera is now, and
//! the old move's [`SettleAction`]s are dropped without firing.
//!
//! # Frame lifecycle
//!
//! ```text
//! animate_view ──► tick ─► tick ─► ... ─► camera settles
//!                                             │ settle delay
//!                                             ▼
//!                                   ViewFrame { settled: [actions] }
//! ```

use std::time::Duration;

use scrolly_core::animation::{Animation, Delayed, Easing, Milestone, Milestones, Tween, delay, lerp};
use scrolly_core::geometry::{Point, Size};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::CitySpec;

/// Frame interval used by [`animate_view`].
pub const FRAME: Duration = Duration::from_millis(16);

/// Map camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionViewState {
    /// `[lon, lat]` in degrees.
    pub center: [f64; 2],
    pub scale: f64,
}

impl ProjectionViewState {
    pub const fn new(center: [f64; 2], scale: f64) -> Self {
        Self { center, scale }
    }

    /// Camera for a config `zoom` level.
    pub fn from_zoom(center: [f64; 2], zoom: f64, scale_per_zoom: f64) -> Self {
        Self::new(center, zoom * scale_per_zoom)
    }

    /// Center and scale interpolated independently at `t`.
    pub fn lerp(&self, target: &Self, t: f64) -> Self {
        Self {
            center: [
                lerp(self.center[0], target.center[0], t),
                lerp(self.center[1], target.center[1], t),
            ],
            scale: lerp(self.scale, target.scale, t),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.center.iter().all(|c| c.is_finite()) && self.scale.is_finite()
    }
}

/// Natural Earth projection of a camera onto a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    state: ProjectionViewState,
    translate: Point,
    origin: (f64, f64),
}

impl Projection {
    /// Projection centering `state.center` in a viewport of `size`.
    pub fn new(state: ProjectionViewState, size: Size) -> Self {
        Self {
            state,
            translate: Point::new(size.width / 2.0, size.height / 2.0),
            origin: natural_earth(state.center[0].to_radians(), state.center[1].to_radians()),
        }
    }

    pub fn state(&self) -> ProjectionViewState {
        self.state
    }

    /// Screen position of `[lon, lat]`.
    pub fn project(&self, lon_lat: [f64; 2]) -> Point {
        let (x, y) = natural_earth(lon_lat[0].to_radians(), lon_lat[1].to_radians());
        Point::new(
            self.translate.x + self.state.scale * (x - self.origin.0),
            self.translate.y - self.state.scale * (y - self.origin.1),
        )
    }
}

/// Natural Earth I raw projection, radians in, unit plane out.
fn natural_earth(lambda: f64, phi: f64) -> (f64, f64) {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    let x = lambda
        * (0.8707 - 0.131979 * phi2
            + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4)));
    let y = phi
        * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)));
    (x, y)
}

/// Work deferred until the camera has settled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SettleAction {
    HighlightCountries(Vec<String>),
    ShowMarkers(Vec<CitySpec>),
    FocusCity(CitySpec),
}

/// One sampled camera frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrame {
    pub state: ProjectionViewState,
    /// Eased progress of the move in [0, 1].
    pub progress: f64,
    /// Actions released on this frame.
    pub settled: Vec<SettleAction>,
    /// The move and its settle delay are both over.
    pub finished: bool,
}

#[derive(Debug, Clone)]
struct ViewTransition {
    id: u64,
    from: ProjectionViewState,
    to: ProjectionViewState,
    motion: Milestones<Tween>,
    /// Runs the settle pause once the move's duration has passed.
    settle: Delayed<Tween>,
    actions: Vec<SettleAction>,
}

/// Owns the camera and drives moves frame by frame.
#[derive(Debug, Clone)]
pub struct MapViewDriver {
    current: ProjectionViewState,
    transition: Option<ViewTransition>,
    easing: Easing,
    settle_delay: Duration,
    next_id: u64,
}

impl MapViewDriver {
    pub fn new(initial: ProjectionViewState) -> Self {
        Self {
            current: initial,
            transition: None,
            easing: Easing::EaseInOutCubic,
            settle_delay: Duration::ZERO,
            next_id: 0,
        }
    }

    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Pause between the camera stopping and settle actions firing.
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Camera as of the last tick.
    pub fn current(&self) -> ProjectionViewState {
        self.current
    }

    pub fn target(&self) -> Option<ProjectionViewState> {
        self.transition.as_ref().map(|t| t.to)
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Move the camera to `target` over `duration`, then release `actions`.
    ///
    /// Supersedes any move in flight; its actions never fire.
    pub fn animate_view(&mut self, target: ProjectionViewState, duration: Duration, actions: Vec<SettleAction>) {
        if let Some(old) = self.transition.take() {
            debug!(
                superseded = old.id,
                dropped_actions = old.actions.len(),
                "map move superseded"
            );
        }
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, ?target, duration_ms = duration.as_millis() as u64, "map move started");
        self.transition = Some(ViewTransition {
            id,
            from: self.current,
            to: target,
            motion: Milestones::new(Tween::new(duration).easing(self.easing.function())),
            settle: delay(duration, Tween::new(self.settle_delay)),
            actions,
        });
    }

    /// Jump without animating. Only valid while the map is hidden.
    pub fn jump_to(&mut self, state: ProjectionViewState) {
        self.transition = None;
        self.current = state;
    }

    /// Drop the move in flight, leaving the camera where it is.
    pub fn cancel(&mut self) -> bool {
        self.transition.take().is_some()
    }

    /// Advance by `dt`. `None` when no move is in flight.
    pub fn tick(&mut self, dt: Duration) -> Option<ViewFrame> {
        let transition = self.transition.as_mut()?;
        transition.settle.tick(dt);
        if !transition.motion.has_settled() {
            transition.motion.tick(dt);
            self.current = transition.from.lerp(&transition.to, transition.motion.value());
            for milestone in transition.motion.drain() {
                if milestone == Milestone::Settled {
                    self.current = transition.to;
                }
            }
        }
        let progress = transition.motion.value();

        let finished = transition.motion.has_settled()
            && (self.settle_delay.is_zero() || transition.settle.is_complete());
        let settled = if finished {
            std::mem::take(&mut transition.actions)
        } else {
            Vec::new()
        };
        trace!(id = transition.id, progress, "map frame");

        if finished {
            debug!(id = transition.id, actions = settled.len(), "map move settled");
            self.transition = None;
        }
        Some(ViewFrame {
            state: self.current,
            progress,
            settled,
            finished,
        })
    }
}

/// Drive a move to completion, calling `on_frame` once per 16ms frame.
///
/// Returns the number of frames produced. The last frame is exactly `target`.
pub fn animate_view(
    current: ProjectionViewState,
    target: ProjectionViewState,
    duration_ms: u64,
    easing: Easing,
    mut on_frame: impl FnMut(ProjectionViewState),
) -> usize {
    let mut driver = MapViewDriver::new(current).easing(easing);
    driver.animate_view(target, Duration::from_millis(duration_ms), Vec::new());
    let mut frames = 0;
    while let Some(frame) = driver.tick(FRAME) {
        on_frame(frame.state);
        frames += 1;
        if frame.finished {
            break;
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: ProjectionViewState = ProjectionViewState::new([0.0, 20.0], 150.0);
    const AFRICA: ProjectionViewState = ProjectionViewState::new([20.0, 0.0], 450.0);

    fn city(name: &str) -> CitySpec {
        CitySpec {
            name: name.into(),
            coordinates: [36.8, -1.3],
        }
    }

    #[test]
    fn center_projects_to_viewport_middle() {
        let p = Projection::new(AFRICA, Size::new(800.0, 600.0));
        let c = p.project(AFRICA.center);
        assert!((c.x - 400.0).abs() < 1e-9);
        assert!((c.y - 300.0).abs() < 1e-9);
        let east = p.project([30.0, 0.0]);
        assert!(east.x > 400.0);
        let north = p.project([20.0, 10.0]);
        assert!(north.y < 300.0);
    }

    #[test]
    fn lerp_interpolates_parameters_independently() {
        let mid = WORLD.lerp(&AFRICA, 0.5);
        assert_eq!(mid, ProjectionViewState::new([10.0, 10.0], 300.0));
    }

    #[test]
    fn from_zoom_scales_linearly() {
        assert_eq!(ProjectionViewState::from_zoom([0.0, 0.0], 3.0, 150.0).scale, 450.0);
    }

    #[test]
    fn free_function_ends_on_target() {
        let mut frames = Vec::new();
        let n = animate_view(WORLD, AFRICA, 160, Easing::Linear, |s| frames.push(s));
        assert_eq!(n, 10);
        assert_eq!(frames.last(), Some(&AFRICA));
        for pair in frames.windows(2) {
            assert!(pair[1].scale >= pair[0].scale);
        }
    }

    #[test]
    fn actions_wait_for_settle_delay() {
        let mut driver = MapViewDriver::new(WORLD).settle_delay(Duration::from_millis(200));
        driver.animate_view(
            AFRICA,
            Duration::from_millis(100),
            vec![SettleAction::HighlightCountries(vec!["KEN".into()])],
        );

        let frame = driver.tick(Duration::from_millis(100)).unwrap();
        assert_eq!(frame.state, AFRICA);
        assert!(frame.settled.is_empty());

        let frame = driver.tick(Duration::from_millis(150)).unwrap();
        assert!(frame.settled.is_empty());

        let frame = driver.tick(Duration::from_millis(50)).unwrap();
        assert_eq!(frame.settled.len(), 1);
        assert!(frame.finished);
        assert!(!driver.is_animating());
        assert!(driver.tick(FRAME).is_none());
    }

    #[test]
    fn settle_delay_counts_time_past_the_move_in_one_tick() {
        let mut driver = MapViewDriver::new(WORLD).settle_delay(Duration::from_millis(200));
        driver.animate_view(
            AFRICA,
            Duration::from_millis(100),
            vec![SettleAction::FocusCity(city("Nairobi"))],
        );

        let frame = driver.tick(Duration::from_millis(250)).unwrap();
        assert_eq!(frame.state, AFRICA);
        assert_eq!(frame.progress, 1.0);
        assert!(!frame.finished);

        let frame = driver.tick(Duration::from_millis(50)).unwrap();
        assert_eq!(frame.settled, vec![SettleAction::FocusCity(city("Nairobi"))]);
        assert!(frame.finished);
    }

    #[test]
    fn superseded_move_drops_its_actions_and_starts_midway() {
        let mut driver = MapViewDriver::new(WORLD).easing(Easing::Linear);
        driver.animate_view(AFRICA, Duration::from_millis(100), vec![SettleAction::ShowMarkers(vec![city("Nairobi")])]);
        driver.tick(Duration::from_millis(50));
        let midway = driver.current();
        assert_eq!(midway, WORLD.lerp(&AFRICA, 0.5));

        driver.animate_view(WORLD, Duration::from_millis(100), Vec::new());
        let first = driver.tick(Duration::ZERO).unwrap();
        assert_eq!(first.state, midway);

        let mut released = Vec::new();
        while let Some(frame) = driver.tick(FRAME) {
            released.extend(frame.settled);
        }
        assert!(released.is_empty());
        assert_eq!(driver.current(), WORLD);
    }

    #[test]
    fn cancel_leaves_camera_in_place() {
        let mut driver = MapViewDriver::new(WORLD).easing(Easing::Linear);
        driver.animate_view(AFRICA, Duration::from_millis(100), Vec::new());
        driver.tick(Duration::from_millis(25));
        let here = driver.current();
        assert!(driver.cancel());
        assert!(!driver.cancel());
        assert_eq!(driver.current(), here);
    }
}
