//! Horizontal drag interpretation for the lightbox.
//!
//! A gesture moves `Idle -> Dragging -> Idle`. Two thresholds apply: the
//! jitter threshold decides when the tracker claims the pointer (and the page
//! stops scrolling), the commit threshold decides on release whether the drag
//! becomes a navigation.

use super::Direction;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Dragging {
        start_x: f32,
        delta: f32,
        claimed: bool,
    },
}

/// Result of feeding a move sample to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSample {
    /// Signed displacement from the gesture start, in pixels.
    pub delta: f32,
    /// Whether the gesture has crossed the jitter threshold at any point.
    pub claimed: bool,
}

/// How a finished gesture should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Never crossed the jitter threshold; behaves like a click.
    Tap,
    /// A real drag that did not qualify for navigation.
    Revert,
    /// Navigate one step in the given direction.
    Commit(Direction),
}

#[derive(Debug, Clone)]
pub struct GestureTracker {
    jitter_threshold: f32,
    commit_threshold: f32,
    phase: Phase,
}

impl GestureTracker {
    pub fn new(jitter_threshold: f32, commit_threshold: f32) -> Self {
        Self {
            jitter_threshold,
            commit_threshold,
            phase: Phase::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Whether the active gesture owns the pointer exclusively.
    pub fn is_claimed(&self) -> bool {
        matches!(self.phase, Phase::Dragging { claimed: true, .. })
    }

    pub fn start(&mut self, x: f32) {
        self.phase = Phase::Dragging {
            start_x: x,
            delta: 0.0,
            claimed: false,
        };
    }

    /// Record a move sample. Returns `None` when no gesture is active.
    pub fn update(&mut self, x: f32) -> Option<DragSample> {
        let Phase::Dragging {
            start_x,
            delta,
            claimed,
        } = &mut self.phase
        else {
            return None;
        };
        *delta = x - *start_x;
        if delta.abs() > self.jitter_threshold {
            *claimed = true;
        }
        Some(DragSample {
            delta: *delta,
            claimed: *claimed,
        })
    }

    /// Finish the gesture and classify it against the commit threshold.
    ///
    /// `at_first`/`at_last` describe the active index so that a swipe past
    /// either end of the catalog reverts instead of committing.
    pub fn release(&mut self, at_first: bool, at_last: bool) -> Option<Release> {
        let Phase::Dragging { delta, claimed, .. } = std::mem::replace(&mut self.phase, Phase::Idle)
        else {
            return None;
        };
        if !claimed {
            return Some(Release::Tap);
        }
        let outcome = if delta < -self.commit_threshold && !at_last {
            Release::Commit(Direction::Next)
        } else if delta > self.commit_threshold && !at_first {
            Release::Commit(Direction::Previous)
        } else {
            Release::Revert
        };
        Some(outcome)
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}
