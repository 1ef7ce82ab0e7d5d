#![forbid(unsafe_code)]

//! Visibility and placement shared by every content handler.
//!
//! Chart, map and image regions all fade in and out the same way and accept
//! the same `position` block from step config. [`Presence`] holds that state;
//! handlers embed one and get `show`/`hide`/`apply_placement` through the
//! [`Positioned`] trait's default methods.

use std::time::Duration;

use scrolly_core::animation::{Animation, Easing, Tween, lerp};
use scrolly_core::geometry::{Rect, Size};
use scrolly_layout::Length;
use serde::{Deserialize, Serialize};

/// Default fade duration.
pub const DEFAULT_FADE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// The `position` block of a chart, map or image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub vertical: Option<VerticalAlign>,
    pub horizontal: Option<HorizontalAlign>,
    /// Region width; relative values resolve against the viewport.
    pub width: Option<Length>,
    pub height: Option<Length>,
}

impl Placement {
    /// Region for content of `natural` size inside `viewport`.
    ///
    /// Explicit width/height override the natural size; the result never
    /// exceeds the viewport.
    pub fn resolve(&self, viewport: Rect, natural: Size) -> Rect {
        let width = self
            .width
            .map_or(natural.width, |w| w.resolve(viewport.width))
            .clamp(0.0, viewport.width.max(0.0));
        let height = self
            .height
            .map_or(natural.height, |h| h.resolve(viewport.height))
            .clamp(0.0, viewport.height.max(0.0));

        let x = match self.horizontal.unwrap_or_default() {
            HorizontalAlign::Left => viewport.x,
            HorizontalAlign::Center => viewport.x + (viewport.width - width) / 2.0,
            HorizontalAlign::Right => viewport.right() - width,
        };
        let y = match self.vertical.unwrap_or_default() {
            VerticalAlign::Top => viewport.y,
            VerticalAlign::Center => viewport.y + (viewport.height - height) / 2.0,
            VerticalAlign::Bottom => viewport.bottom() - height,
        };
        Rect::new(x, y, width, height)
    }
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    tween: Tween,
    from: f64,
    to: f64,
}

/// Visibility, fade and placement of one content region.
#[derive(Debug, Clone)]
pub struct Presence {
    visible: bool,
    placement: Placement,
    fade: Option<Fade>,
    fade_duration: Duration,
}

impl Default for Presence {
    fn default() -> Self {
        Self::new(DEFAULT_FADE)
    }
}

impl Presence {
    /// Hidden region with the given fade duration.
    pub fn new(fade_duration: Duration) -> Self {
        Self {
            visible: false,
            placement: Placement::default(),
            fade: None,
            fade_duration,
        }
    }

    /// Whether the region is logically shown. Flips immediately on
    /// `show`/`hide`, before the fade finishes.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Current opacity in [0, 1].
    pub fn opacity(&self) -> f64 {
        match &self.fade {
            Some(fade) => lerp(fade.from, fade.to, fade.tween.value()),
            None if self.visible => 1.0,
            None => 0.0,
        }
    }

    /// Start fading in. No-op when already shown.
    pub fn show(&mut self) {
        if self.visible {
            return;
        }
        self.start_fade(true);
        self.visible = true;
    }

    /// Start fading out. No-op when already hidden.
    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.start_fade(false);
        self.visible = false;
    }

    /// Fade from the current opacity. A reversal mid-fade only takes the
    /// share of the duration it has left to cover.
    fn start_fade(&mut self, to_visible: bool) {
        let from = self.opacity();
        let to = if to_visible { 1.0 } else { 0.0 };
        let duration = self.fade_duration.mul_f64((to - from).abs());
        let tween = Tween::new(duration).easing(Easing::EaseInOut.function());
        self.fade = Some(Fade { tween, from, to });
    }

    /// Replace the placement. `None` keeps the current one.
    pub fn set_placement(&mut self, placement: Option<&Placement>) {
        if let Some(placement) = placement {
            self.placement = *placement;
        }
    }

    /// Advance the fade.
    pub fn tick(&mut self, dt: Duration) {
        if let Some(fade) = &mut self.fade {
            fade.tween.tick(dt);
            if fade.tween.is_complete() {
                self.fade = None;
            }
        }
    }

    /// Screen region for content of `natural` size.
    pub fn region(&self, viewport: Rect, natural: Size) -> Rect {
        self.placement.resolve(viewport, natural)
    }
}

/// Anything owning a [`Presence`].
pub trait Positioned {
    fn presence(&self) -> &Presence;

    fn presence_mut(&mut self) -> &mut Presence;

    fn show(&mut self) {
        self.presence_mut().show();
    }

    fn hide(&mut self) {
        self.presence_mut().hide();
    }

    fn apply_placement(&mut self, placement: Option<&Placement>) {
        self.presence_mut().set_placement(placement);
    }

    fn is_visible(&self) -> bool {
        self.presence().is_visible()
    }
}
