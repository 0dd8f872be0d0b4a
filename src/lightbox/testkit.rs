//! Deterministic timer source for driving a [`Lightbox`] without a runtime.

use std::time::Duration;

use super::history::NavigationStack;
use super::sequencer::{Ticket, Timers};
use super::Lightbox;

/// Virtual clock that records scheduled tickets and releases them on demand.
#[derive(Debug, Default)]
pub struct ManualTimers {
    now: Duration,
    queue: Vec<(Duration, Ticket)>,
}

impl ManualTimers {
    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of scheduled, uncancelled tickets.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Earliest scheduled ticket without removing it.
    pub fn peek(&self) -> Option<Ticket> {
        self.earliest().map(|pos| self.queue[pos].1)
    }

    /// Remove the earliest ticket due at or before `deadline` and move the
    /// clock to its due time.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<Ticket> {
        let pos = self.earliest()?;
        let (due, ticket) = self.queue[pos];
        if due > deadline {
            return None;
        }
        self.queue.remove(pos);
        self.now = self.now.max(due);
        Some(ticket)
    }

    fn earliest(&self) -> Option<usize> {
        self.queue
            .iter()
            .enumerate()
            .min_by_key(|(_, (due, ticket))| (*due, ticket.seq))
            .map(|(pos, _)| pos)
    }
}

impl Timers for ManualTimers {
    fn schedule(&mut self, ticket: Ticket, after: Duration) {
        self.queue.push((self.now + after, ticket));
    }

    fn cancel(&mut self, ticket: Ticket) {
        self.queue.retain(|(_, t)| *t != ticket);
    }
}

impl<H: NavigationStack> Lightbox<H, ManualTimers> {
    /// Move the virtual clock forward, firing every timer that falls due.
    pub fn advance(&mut self, by: Duration) {
        let deadline = self.timers.now() + by;
        while let Some(ticket) = self.timers.pop_due(deadline) {
            self.on_timer(ticket);
            self.pump_history();
        }
        self.timers.now = deadline;
    }

    /// Fire everything that is scheduled, however far out.
    pub fn settle(&mut self) {
        while let Some(ticket) = self.timers.pop_due(Duration::MAX) {
            self.on_timer(ticket);
            self.pump_history();
        }
    }
}
