//! Slide-out / swap / slide-in sequencing for committed navigations.
//!
//! Timers are requested through the [`Timers`] seam and identified by a
//! [`Ticket`]. A ticket that does not match the transition currently in flight
//! is stale and is ignored, so a cancelled or superseded timer can never write
//! state.

use std::time::Duration;

use tracing::debug;

use super::Direction;

/// What a scheduled timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    SlideOut,
    SlideIn,
    Close,
}

/// Identity of one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub session: u64,
    pub seq: u64,
    pub kind: TimerKind,
}

/// Scheduling primitive for deferred callbacks.
///
/// Implementations call back into the lightbox with the ticket once `after`
/// has elapsed, unless the ticket was cancelled first.
pub trait Timers {
    fn schedule(&mut self, ticket: Ticket, after: Duration);
    fn cancel(&mut self, ticket: Ticket);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// The current image is leaving the screen.
    SlideOut,
    /// The index has been swapped; the new image is entering.
    SlideIn,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: Ticket,
    target: usize,
    direction: Direction,
    phase: Phase,
}

/// Outcome of [`AnimationSequencer::animate_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animate {
    Started,
    /// Another transition is in flight; the request was dropped.
    Busy,
    /// `new_index` has no image behind it.
    OutOfBounds,
}

/// What the caller should apply after a timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Swap to `index` and bring it in from the edge opposite `direction`.
    SwapIn { index: usize, direction: Direction },
    /// The transition finished at `index`.
    Settled { index: usize },
}

#[derive(Debug)]
pub struct AnimationSequencer {
    phase_duration: Duration,
    in_flight: Option<InFlight>,
    next_seq: u64,
}

impl AnimationSequencer {
    pub fn new(phase_duration: Duration) -> Self {
        Self {
            phase_duration,
            in_flight: None,
            next_seq: 0,
        }
    }

    pub fn phase_duration(&self) -> Duration {
        self.phase_duration
    }

    pub fn is_animating(&self) -> bool {
        self.in_flight.is_some()
    }

    #[cfg(test)]
    fn phase(&self) -> Option<Phase> {
        self.in_flight.map(|f| f.phase)
    }

    /// Begin a transition towards `new_index`.
    ///
    /// Re-entrant requests are dropped rather than queued.
    pub fn animate_to(
        &mut self,
        new_index: usize,
        direction: Direction,
        catalog_len: usize,
        session: u64,
        timers: &mut impl Timers,
    ) -> Animate {
        if new_index >= catalog_len {
            return Animate::OutOfBounds;
        }
        if let Some(current) = self.in_flight {
            debug!(
                target_index = new_index,
                in_flight_target = current.target,
                "navigation dropped; transition already in flight"
            );
            return Animate::Busy;
        }
        let ticket = self.ticket(session, TimerKind::SlideOut);
        timers.schedule(ticket, self.phase_duration);
        self.in_flight = Some(InFlight {
            ticket,
            target: new_index,
            direction,
            phase: Phase::SlideOut,
        });
        Animate::Started
    }

    /// Advance the transition if `ticket` belongs to it.
    pub fn on_timer(&mut self, ticket: Ticket, timers: &mut impl Timers) -> Option<Step> {
        let current = self.in_flight?;
        if current.ticket != ticket {
            debug!(?ticket, "stale animation timer ignored");
            return None;
        }
        match current.phase {
            Phase::SlideOut => {
                let next = self.ticket(ticket.session, TimerKind::SlideIn);
                timers.schedule(next, self.phase_duration);
                self.in_flight = Some(InFlight {
                    ticket: next,
                    phase: Phase::SlideIn,
                    ..current
                });
                Some(Step::SwapIn {
                    index: current.target,
                    direction: current.direction,
                })
            }
            Phase::SlideIn => {
                self.in_flight = None;
                Some(Step::Settled {
                    index: current.target,
                })
            }
        }
    }

    /// Drop the transition in flight and its pending timer.
    pub fn cancel(&mut self, timers: &mut impl Timers) {
        if let Some(current) = self.in_flight.take() {
            timers.cancel(current.ticket);
            debug!(target_index = current.target, "transition cancelled");
        }
    }

    pub(crate) fn ticket(&mut self, session: u64, kind: TimerKind) -> Ticket {
        self.next_seq += 1;
        Ticket {
            session,
            seq: self.next_seq,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lightbox::testkit::ManualTimers;

    const PHASE: Duration = Duration::from_millis(220);

    #[test]
    fn runs_both_phases_then_settles() {
        let mut timers = ManualTimers::default();
        let mut seq = AnimationSequencer::new(PHASE);
        assert_eq!(
            seq.animate_to(2, Direction::Next, 3, 1, &mut timers),
            Animate::Started
        );
        assert_eq!(seq.phase(), Some(Phase::SlideOut));

        let out = timers.pop_due(PHASE).unwrap();
        assert_eq!(out.kind, TimerKind::SlideOut);
        assert_eq!(
            seq.on_timer(out, &mut timers),
            Some(Step::SwapIn {
                index: 2,
                direction: Direction::Next
            })
        );

        assert!(timers.pop_due(PHASE).is_none());
        let inn = timers.pop_due(PHASE * 2).unwrap();
        assert_eq!(inn.kind, TimerKind::SlideIn);
        assert_eq!(seq.on_timer(inn, &mut timers), Some(Step::Settled { index: 2 }));
        assert!(!seq.is_animating());
    }

    #[test]
    fn drops_reentrant_requests() {
        let mut timers = ManualTimers::default();
        let mut seq = AnimationSequencer::new(PHASE);
        seq.animate_to(1, Direction::Next, 3, 1, &mut timers);
        assert_eq!(
            seq.animate_to(2, Direction::Next, 3, 1, &mut timers),
            Animate::Busy
        );
        assert_eq!(timers.pending(), 1);
    }

    #[test]
    fn out_of_bounds_is_a_noop() {
        let mut timers = ManualTimers::default();
        let mut seq = AnimationSequencer::new(PHASE);
        assert_eq!(
            seq.animate_to(3, Direction::Next, 3, 1, &mut timers),
            Animate::OutOfBounds
        );
        assert!(!seq.is_animating());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn cancelled_ticket_is_stale() {
        let mut timers = ManualTimers::default();
        let mut seq = AnimationSequencer::new(PHASE);
        seq.animate_to(1, Direction::Next, 3, 1, &mut timers);
        let ticket = timers.peek().unwrap();
        seq.cancel(&mut timers);
        assert_eq!(timers.pending(), 0);
        assert_eq!(seq.on_timer(ticket, &mut timers), None);
    }
}
