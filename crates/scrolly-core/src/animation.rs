#![forbid(unsafe_code)]

//! Time-bounded animation primitives.
//!
//! Animations are driven by the host's frame clock: each frame the caller
//! passes the elapsed [`Duration`] to [`Animation::tick`] and samples
//! [`Animation::value`], a normalized `f64` in [0.0, 1.0]. Nothing here owns a
//! timer or a thread; cancelling an animation is dropping it.
//!
//! Interpolated quantities (projection center and scale, opacity) are derived
//! from `value()` by the caller, so the same primitive drives any parameter.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod milestones;

pub use milestones::{Milestone, Milestones};

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f64) -> f64;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in (slow start).
#[inline]
pub fn ease_in(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out (slow end).
#[inline]
pub fn ease_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-in-out, the default camera curve for map moves.
#[inline]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Named easing curve, as written in presentation config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    EaseInOutCubic,
}

impl Easing {
    /// The function implementing this curve.
    #[must_use]
    pub const fn function(self) -> EasingFn {
        match self {
            Easing::Linear => linear,
            Easing::EaseIn => ease_in,
            Easing::EaseOut => ease_out,
            Easing::EaseInOut => ease_in_out,
            Easing::EaseInOutCubic => ease_in_out_cubic,
        }
    }

    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        (self.function())(t)
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current output value, clamped to [0.0, 1.0].
    fn value(&self) -> f64;

    /// Reset the animation to its initial state.
    fn reset(&mut self);
}

/// Zero durations are bumped to one nanosecond so progress is always defined.
fn nonzero(duration: Duration) -> Duration {
    if duration.is_zero() {
        Duration::from_nanos(1)
    } else {
        duration
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// Progression from 0.0 to 1.0 over a duration, shaped by an easing curve.
///
/// Elapsed time is accumulated as a [`Duration`] so many small frame ticks do
/// not drift.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Tween {
    /// Create a tween with the given duration and linear easing.
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: nonzero(duration),
            easing: linear,
        }
    }

    /// Set the easing function.
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Total duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Linear progress before easing, in [0.0, 1.0].
    pub fn raw_progress(&self) -> f64 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f64 {
        (self.easing)(self.raw_progress())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Delayed
// ---------------------------------------------------------------------------

/// Hold at 0.0 for a delay, then play the inner animation.
///
/// Time past the delay within a single tick is carried into the inner
/// animation.
#[derive(Debug, Clone, Copy)]
pub struct Delayed<A> {
    delay: Duration,
    elapsed: Duration,
    inner: A,
    started: bool,
}

impl<A: Animation> Delayed<A> {
    pub fn new(delay: Duration, inner: A) -> Self {
        Self {
            delay,
            elapsed: Duration::ZERO,
            inner,
            started: delay.is_zero(),
        }
    }
}

impl<A: Animation> Animation for Delayed<A> {
    fn tick(&mut self, dt: Duration) {
        if self.started {
            self.inner.tick(dt);
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed >= self.delay {
            self.started = true;
            let carry = self.elapsed - self.delay;
            if !carry.is_zero() {
                self.inner.tick(carry);
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.started && self.inner.is_complete()
    }

    fn value(&self) -> f64 {
        if self.started { self.inner.value() } else { 0.0 }
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.started = self.delay.is_zero();
        self.inner.reset();
    }
}

/// Create a [`Delayed`] animation.
pub fn delay<A: Animation>(d: Duration, a: A) -> Delayed<A> {
    Delayed::new(d, a)
}

/// Interpolate a scalar between `from` and `to` at normalized `t`.
#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
