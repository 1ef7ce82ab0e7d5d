#![forbid(unsafe_code)]

//! Scroll step events.
//!
//! The scroll observer (outside this workspace) watches the narrative column
//! and reports when a step element crosses the trigger line. These types are
//! the whole of that boundary: an index, a direction, and the logical name the
//! step element carries, if any.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scroll direction at the moment a step boundary was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Reader is moving forward through the story.
    #[default]
    Down,
    /// Reader is scrolling back.
    Up,
}

impl Direction {
    /// Short label, matching the observer's wire values.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
        }
    }

    #[inline]
    pub const fn is_backward(self) -> bool {
        matches!(self, Direction::Up)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A step boundary crossing reported by the scroll observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Integer scroll-step index of the element.
    pub index: usize,
    pub direction: Direction,
    /// Logical step name carried by the element (`data-step`), when present.
    #[serde(default)]
    pub name: Option<String>,
}

impl StepEvent {
    /// Create an event for an element without a logical name.
    pub fn new(index: usize, direction: Direction) -> Self {
        Self {
            index,
            direction,
            name: None,
        }
    }

    /// Attach the element's logical step name (builder).
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Progress through a step, as reported while the step stays active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    pub step: StepEvent,
    /// Fraction of the step scrolled through, in [0, 1].
    pub progress: f64,
}

impl StepProgress {
    /// Create a progress report; `progress` is clamped to [0, 1].
    pub fn new(step: StepEvent, progress: f64) -> Self {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { step, progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_wire_values() {
        let up: Direction = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(up, Direction::Up);
        assert!(up.is_backward());
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn progress_is_clamped() {
        let ev = StepEvent::new(3, Direction::Down);
        assert_eq!(StepProgress::new(ev.clone(), 1.4).progress, 1.0);
        assert_eq!(StepProgress::new(ev.clone(), -0.2).progress, 0.0);
        assert_eq!(StepProgress::new(ev, f64::NAN).progress, 0.0);
    }

    #[test]
    fn named_builder() {
        let ev = StepEvent::new(1, Direction::Up).named("intro");
        assert_eq!(ev.name.as_deref(), Some("intro"));
    }
}
