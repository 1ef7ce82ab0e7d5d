#![forbid(unsafe_code)]

//! Milestone tracking for animations.
//!
//! [`Milestones`] wraps any [`Animation`] and queues a [`Milestone`] when the
//! animation receives its first tick and when it settles. The caller polls the
//! queue with [`drain`](Milestones::drain) after each frame.
//!
//! Work that must wait for an animation to finish (recoloring, marker
//! insertion) is keyed off `Settled` rather than run alongside the motion.
//!
//! # Invariants
//!
//! 1. `Started` fires at most once per play-through.
//! 2. `Settled` fires at most once, on the tick where `is_complete()` flips.
//! 3. `drain()` empties the queue; events are not replayed.
//! 4. Dropping the wrapper before it settles means `Settled` never fires.

use std::time::Duration;

use super::Animation;

/// A lifecycle point reached by a wrapped animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    /// First tick received.
    Started,
    /// The animation reached its end.
    Settled,
}

/// An animation wrapper that records milestones as they are crossed.
#[derive(Debug, Clone)]
pub struct Milestones<A> {
    inner: A,
    started: bool,
    settled: bool,
    queue: Vec<Milestone>,
}

impl<A: Animation> Milestones<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            started: false,
            settled: false,
            queue: Vec::new(),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Take every queued milestone.
    pub fn drain(&mut self) -> Vec<Milestone> {
        std::mem::take(&mut self.queue)
    }

    /// Whether `Settled` has been emitted.
    pub fn has_settled(&self) -> bool {
        self.settled
    }
}

impl<A: Animation> Animation for Milestones<A> {
    fn tick(&mut self, dt: Duration) {
        self.inner.tick(dt);
        if !self.started {
            self.started = true;
            self.queue.push(Milestone::Started);
        }
        if !self.settled && self.inner.is_complete() {
            self.settled = true;
            self.queue.push(Milestone::Settled);
        }
    }

    fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }

    fn value(&self) -> f64 {
        self.inner.value()
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.started = false;
        self.settled = false;
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Tween, delay};

    const MS_100: Duration = Duration::from_millis(100);

    #[test]
    fn started_then_settled() {
        let mut m = Milestones::new(Tween::new(Duration::from_millis(250)));
        m.tick(MS_100);
        assert_eq!(m.drain(), vec![Milestone::Started]);
        m.tick(MS_100);
        assert!(m.drain().is_empty());
        m.tick(MS_100);
        assert_eq!(m.drain(), vec![Milestone::Settled]);
        m.tick(MS_100);
        assert!(m.drain().is_empty(), "settled fires once");
    }

    #[test]
    fn single_long_tick_emits_both_in_order() {
        let mut m = Milestones::new(delay(MS_100, Tween::new(MS_100)));
        m.tick(Duration::from_secs(1));
        assert_eq!(m.drain(), vec![Milestone::Started, Milestone::Settled]);
        assert!(m.has_settled());
    }

    #[test]
    fn reset_rearms() {
        let mut m = Milestones::new(Tween::new(MS_100));
        m.tick(MS_100);
        let _ = m.drain();
        m.reset();
        assert!(!m.has_settled());
        m.tick(MS_100);
        assert_eq!(m.drain(), vec![Milestone::Started, Milestone::Settled]);
    }
}
