//! Keeps "lightbox open" in step with the navigation stack so that a back
//! navigation closes the viewer instead of leaving the page.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::error::HistoryError;

/// State attached to the entry pushed when a lightbox session opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub session: u64,
    pub index: usize,
}

/// A back/forward notification: the state of the entry that became current.
/// `None` is a plain page entry.
pub type PopEvent = Option<Marker>;

/// Platform navigation stack as seen by the lightbox.
pub trait NavigationStack {
    /// Best-effort push of a marker entry.
    fn push_marker(&mut self, marker: Marker) -> Result<(), HistoryError>;
    /// Navigate back one entry. The matching notification arrives later via
    /// [`NavigationStack::poll_pop`].
    fn back(&mut self);
    /// Navigate forward one entry, if there is one.
    fn forward(&mut self);
    /// Next pending back/forward notification.
    fn poll_pop(&mut self) -> Option<PopEvent>;
}

/// Decision for an incoming pop notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopAction {
    Ignore,
    Close,
}

/// Bookkeeping for the marker owned by the current session.
#[derive(Debug, Default)]
pub struct HistoryBridge {
    token: bool,
    awaiting_pop: bool,
}

impl HistoryBridge {
    /// Whether this session pushed a marker that is still on the stack.
    pub fn has_token(&self) -> bool {
        self.token
    }

    /// Whether a back navigation has been requested and not yet observed.
    pub fn awaiting_pop(&self) -> bool {
        self.awaiting_pop
    }

    /// Push the session marker, tolerating refusal.
    pub fn push_marker(&mut self, nav: &mut impl NavigationStack, marker: Marker) -> bool {
        match nav.push_marker(marker) {
            Ok(()) => {
                self.token = true;
                debug!(session = marker.session, index = marker.index, "history marker pushed");
            }
            Err(err) => {
                self.token = false;
                warn!(error = %err, "history marker push failed; closing will not navigate back");
            }
        }
        self.token
    }

    /// Ask the platform to pop our marker. Returns `false` when there is no
    /// marker, in which case the caller closes locally.
    pub fn request_back(&mut self, nav: &mut impl NavigationStack) -> bool {
        if !self.token {
            return false;
        }
        if !self.awaiting_pop {
            self.awaiting_pop = true;
            nav.back();
        }
        true
    }

    /// Classify a pop notification for the session `current`.
    ///
    /// Landing on the marker of the current session is our own bookkeeping
    /// (for example a forward navigation back onto it) and is ignored.
    /// Anything else closes an open lightbox.
    pub fn classify(&self, popped: Option<&Marker>, current: Option<u64>) -> PopAction {
        match (popped, current) {
            (Some(marker), Some(session)) if marker.session == session => PopAction::Ignore,
            (_, Some(_)) => PopAction::Close,
            (_, None) => PopAction::Ignore,
        }
    }

    /// Forget the marker; the next close must not navigate back again.
    pub fn clear(&mut self) {
        self.token = false;
        self.awaiting_pop = false;
    }
}

/// In-process navigation stack with browser-like semantics.
///
/// Starts with a single page entry. Pushing truncates any forward entries.
/// Back/forward move the cursor and queue a pop notification carrying the
/// state of the entry that became current.
#[derive(Debug)]
pub struct SessionHistory {
    entries: Vec<PopEvent>,
    cursor: usize,
    enabled: bool,
    max_depth: usize,
    pending: VecDeque<PopEvent>,
}

impl SessionHistory {
    pub fn new(enabled: bool, max_depth: usize) -> Self {
        Self {
            entries: vec![None],
            cursor: 0,
            enabled,
            max_depth: max_depth.max(1),
            pending: VecDeque::new(),
        }
    }

    /// Number of entries up to and including the current one.
    pub fn depth(&self) -> usize {
        self.cursor + 1
    }

    /// Total entries, including forward ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&Marker> {
        self.entries.get(self.cursor).and_then(Option::as_ref)
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new(true, 64)
    }
}

impl NavigationStack for SessionHistory {
    fn push_marker(&mut self, marker: Marker) -> Result<(), HistoryError> {
        if !self.enabled {
            return Err(HistoryError::Disabled);
        }
        if self.depth() >= self.max_depth {
            return Err(HistoryError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Some(marker));
        self.cursor += 1;
        Ok(())
    }

    fn back(&mut self) {
        if self.cursor == 0 {
            debug!("history back at first entry; nothing to pop");
            return;
        }
        self.cursor -= 1;
        self.pending.push_back(self.entries[self.cursor]);
    }

    fn forward(&mut self) {
        if self.cursor + 1 >= self.entries.len() {
            debug!("history forward at last entry; nothing to pop");
            return;
        }
        self.cursor += 1;
        self.pending.push_back(self.entries[self.cursor]);
    }

    fn poll_pop(&mut self) -> Option<PopEvent> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M1: Marker = Marker {
        session: 1,
        index: 0,
    };

    #[test]
    fn push_then_back_restores_depth() {
        let mut h = SessionHistory::default();
        h.push_marker(M1).unwrap();
        assert_eq!(h.depth(), 2);
        h.back();
        assert_eq!(h.depth(), 1);
        assert_eq!(h.poll_pop(), Some(None));
        assert_eq!(h.poll_pop(), None);
    }

    #[test]
    fn forward_lands_on_marker() {
        let mut h = SessionHistory::default();
        h.push_marker(M1).unwrap();
        h.back();
        h.poll_pop();
        h.forward();
        assert_eq!(h.poll_pop(), Some(Some(M1)));
        assert_eq!(h.current(), Some(&M1));
    }

    #[test]
    fn push_truncates_forward_entries() {
        let mut h = SessionHistory::default();
        h.push_marker(M1).unwrap();
        h.back();
        h.push_marker(Marker {
            session: 2,
            index: 1,
        })
        .unwrap();
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn disabled_and_full_stacks_refuse() {
        let mut off = SessionHistory::new(false, 64);
        assert_eq!(off.push_marker(M1), Err(HistoryError::Disabled));

        let mut tiny = SessionHistory::new(true, 1);
        assert_eq!(
            tiny.push_marker(M1),
            Err(HistoryError::DepthExceeded { limit: 1 })
        );
    }

    #[test]
    fn back_is_only_requested_once() {
        let mut h = SessionHistory::default();
        let mut bridge = HistoryBridge::default();
        assert!(bridge.push_marker(&mut h, M1));
        assert!(bridge.request_back(&mut h));
        assert!(bridge.request_back(&mut h));
        assert_eq!(h.depth(), 1);
        assert_eq!(h.poll_pop(), Some(None));
        assert_eq!(h.poll_pop(), None);
    }

    #[test]
    fn classify_ignores_own_marker_only() {
        let bridge = HistoryBridge::default();
        assert_eq!(bridge.classify(Some(&M1), Some(1)), PopAction::Ignore);
        assert_eq!(bridge.classify(Some(&M1), Some(2)), PopAction::Close);
        assert_eq!(bridge.classify(None, Some(1)), PopAction::Close);
        assert_eq!(bridge.classify(None, None), PopAction::Ignore);
    }
}
