//! Lightbox navigation state.
//!
//! [`Lightbox`] is the single source of truth for what the viewer shows. It
//! owns the gesture tracker, the animation sequencer and the history bridge,
//! and routes every close through one transition so drag and animation state
//! are reset in exactly one place.
//!
//! Scheduling and the navigation stack are injected ([`Timers`],
//! [`NavigationStack`]); the async task in `tasks::lightbox` provides tokio
//! backed versions, tests use [`testkit::ManualTimers`] and
//! [`history::SessionHistory`].

pub mod gesture;
pub mod history;
pub mod sequencer;
pub mod testkit;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::LightboxConfig;
use crate::error::LightboxError;
use crate::events::{Frame, HitTarget, Key, LightboxInput, Motion};
use gesture::{GestureTracker, Release};
use history::{HistoryBridge, Marker, NavigationStack, PopAction, PopEvent};
use sequencer::{Animate, AnimationSequencer, Step, Ticket, TimerKind, Timers};

const DEFAULT_VIEWPORT_WIDTH: f32 = 1280.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Closed,
    Open,
    /// Fading out; becomes `Closed` when the close timer fires.
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    /// Neighbour of `index` in this direction, if the catalog has one.
    pub fn step(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Self::Previous => index.checked_sub(1),
            Self::Next => index.checked_add(1).filter(|next| *next < len),
        }
    }

    /// Offset at which the current image has fully left the screen.
    fn exit_offset(self, width: f32) -> f32 {
        match self {
            Self::Next => -width,
            Self::Previous => width,
        }
    }

    /// Offset from which the incoming image enters.
    fn entry_offset(self, width: f32) -> f32 {
        -self.exit_offset(width)
    }
}

/// Observable lightbox state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightboxState {
    pub status: Status,
    /// Defined iff `status != Closed`.
    pub active_index: Option<usize>,
    pub drag_offset: f32,
    pub is_dragging: bool,
    /// This session pushed a navigation-stack marker that is still pending.
    pub history_token: bool,
}

pub struct Lightbox<H, T> {
    catalog_len: usize,
    status: Status,
    active_index: Option<usize>,
    drag_offset: f32,
    motion: Motion,
    viewport_width: f32,
    close_duration: Duration,
    session: u64,
    close_ticket: Option<Ticket>,
    disposed: bool,
    gesture: GestureTracker,
    sequencer: AnimationSequencer,
    bridge: HistoryBridge,
    history: H,
    timers: T,
}

impl<H: NavigationStack, T: Timers> Lightbox<H, T> {
    pub fn new(catalog_len: usize, cfg: &LightboxConfig, history: H, timers: T) -> Self {
        Self {
            catalog_len,
            status: Status::Closed,
            active_index: None,
            drag_offset: 0.0,
            motion: Motion::Immediate,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            close_duration: cfg.close_duration,
            session: 0,
            close_ticket: None,
            disposed: false,
            gesture: GestureTracker::new(cfg.jitter_threshold_px, cfg.commit_threshold_px),
            sequencer: AnimationSequencer::new(cfg.phase_duration),
            bridge: HistoryBridge::default(),
            history,
            timers,
        }
    }

    pub fn state(&self) -> LightboxState {
        LightboxState {
            status: self.status,
            active_index: self.active_index,
            drag_offset: self.drag_offset,
            is_dragging: self.gesture.is_dragging(),
            history_token: self.bridge.has_token(),
        }
    }

    pub fn frame(&self) -> Frame {
        Frame {
            status: self.status,
            active_index: self.active_index,
            offset_px: self.drag_offset,
            motion: self.motion,
            dragging: self.gesture.is_dragging(),
            gesture_claimed: self.gesture.is_claimed(),
            catalog_len: self.catalog_len,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.sequencer.is_animating()
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.viewport_width = width;
        }
    }

    /// Show the image at `index`.
    ///
    /// From `Closed` this starts a new session and pushes one history marker.
    /// While already open it only changes the index. Requests that arrive
    /// while the viewer is closing are ignored.
    pub fn open(&mut self, index: usize) -> Result<(), LightboxError> {
        if self.catalog_len == 0 {
            return Err(LightboxError::EmptyCatalog);
        }
        if index >= self.catalog_len {
            return Err(LightboxError::IndexOutOfRange {
                index,
                len: self.catalog_len,
            });
        }
        if self.disposed {
            return Ok(());
        }
        match self.status {
            Status::Closing => {
                debug!(index, "open ignored while closing");
            }
            Status::Open if self.bridge.awaiting_pop() => {
                debug!(index, "open ignored while a history close is pending");
            }
            Status::Open => {
                self.sequencer.cancel(&mut self.timers);
                self.gesture.reset();
                self.active_index = Some(index);
                self.drag_offset = 0.0;
                self.motion = Motion::Immediate;
                info!(index, session = self.session, "lightbox index changed");
            }
            Status::Closed => {
                self.session += 1;
                self.status = Status::Open;
                self.active_index = Some(index);
                self.drag_offset = 0.0;
                self.motion = Motion::Immediate;
                let marker = Marker {
                    session: self.session,
                    index,
                };
                let pushed = self.bridge.push_marker(&mut self.history, marker);
                info!(
                    index,
                    session = self.session,
                    history_token = pushed,
                    "lightbox opened"
                );
            }
        }
        Ok(())
    }

    /// Close the viewer, going through the navigation stack when a marker
    /// was pushed for this session.
    pub fn request_close(&mut self) {
        if self.disposed || self.status != Status::Open {
            return;
        }
        if self.bridge.request_back(&mut self.history) {
            debug!(session = self.session, "close routed through history back");
            return;
        }
        self.close_transition();
    }

    /// Navigate one image in `direction`; a no-op at either end.
    pub fn commit_navigate(&mut self, direction: Direction) {
        if self.disposed || self.status != Status::Open {
            return;
        }
        let Some(index) = self.active_index else {
            return;
        };
        let Some(target) = direction.step(index, self.catalog_len) else {
            debug!(index, ?direction, "navigation past catalog edge ignored");
            return;
        };
        self.animate_to(target, direction);
    }

    /// Render the current image displaced by `px`. Ignored unless open and
    /// idle.
    pub fn set_drag_offset(&mut self, px: f32) {
        if self.status != Status::Open || self.sequencer.is_animating() {
            return;
        }
        self.drag_offset = px;
        self.motion = Motion::Immediate;
    }

    pub fn gesture_start(&mut self, x: f32) {
        if self.disposed || self.status != Status::Open {
            return;
        }
        if self.sequencer.is_animating() {
            debug!(x, "gesture start ignored during transition");
            return;
        }
        self.gesture.start(x);
        self.set_drag_offset(0.0);
    }

    /// Feed a move sample; returns whether the gesture has claimed the
    /// pointer and default scrolling must be suppressed.
    pub fn gesture_move(&mut self, x: f32) -> bool {
        if self.disposed || self.status != Status::Open {
            return false;
        }
        let Some(sample) = self.gesture.update(x) else {
            return false;
        };
        self.set_drag_offset(sample.delta);
        sample.claimed
    }

    /// Finish the active gesture. A tap is forwarded as a click on `target`.
    pub fn gesture_end(&mut self, target: Option<HitTarget>) -> Option<Release> {
        if self.disposed || self.status != Status::Open {
            self.gesture.reset();
            return None;
        }
        let index = self.active_index?;
        let at_first = index == 0;
        let at_last = index + 1 >= self.catalog_len;
        let release = self.gesture.release(at_first, at_last)?;
        debug!(?release, drag_offset = self.drag_offset, "gesture released");
        match release {
            Release::Tap => {
                self.revert();
                if let Some(target) = target {
                    self.click(target);
                }
            }
            Release::Revert => self.revert(),
            Release::Commit(direction) => self.commit_navigate(direction),
        }
        Some(release)
    }

    pub fn gesture_cancel(&mut self) {
        if self.gesture.is_dragging() {
            self.gesture.reset();
            self.revert();
        }
    }

    pub fn click(&mut self, target: HitTarget) {
        match target {
            HitTarget::Image => {}
            HitTarget::Backdrop | HitTarget::CloseButton => self.request_close(),
            HitTarget::PreviousArrow => self.commit_navigate(Direction::Previous),
            HitTarget::NextArrow => self.commit_navigate(Direction::Next),
        }
    }

    pub fn key(&mut self, key: Key) {
        match key {
            Key::ArrowLeft => self.commit_navigate(Direction::Previous),
            Key::ArrowRight => self.commit_navigate(Direction::Next),
            Key::Escape => self.request_close(),
        }
    }

    /// React to a back/forward notification from the navigation stack.
    pub fn on_history_pop(&mut self, popped: PopEvent) {
        if self.disposed {
            return;
        }
        let current = (self.status != Status::Closed).then_some(self.session);
        match self.bridge.classify(popped.as_ref(), current) {
            PopAction::Ignore => {
                debug!(?popped, "history pop ignored");
            }
            PopAction::Close => {
                self.bridge.clear();
                if self.status == Status::Open {
                    info!(session = self.session, "history pop closes lightbox");
                    self.close_transition();
                }
            }
        }
    }

    /// Deliver every pending navigation-stack notification.
    pub fn pump_history(&mut self) {
        while let Some(popped) = self.history.poll_pop() {
            self.on_history_pop(popped);
        }
    }

    pub fn on_timer(&mut self, ticket: Ticket) {
        if self.disposed || ticket.session != self.session {
            debug!(?ticket, "timer ignored; session is gone");
            return;
        }
        match ticket.kind {
            TimerKind::Close => {
                if self.close_ticket == Some(ticket) {
                    self.finish_close();
                } else {
                    debug!(?ticket, "stale close timer ignored");
                }
            }
            TimerKind::SlideOut | TimerKind::SlideIn => {
                match self.sequencer.on_timer(ticket, &mut self.timers) {
                    Some(Step::SwapIn { index, direction }) => {
                        self.active_index = Some(index);
                        self.drag_offset = 0.0;
                        self.motion = Motion::EnterFrom {
                            from_px: direction.entry_offset(self.viewport_width),
                            duration: self.sequencer.phase_duration(),
                        };
                    }
                    Some(Step::Settled { index }) => {
                        info!(index, "navigation settled");
                    }
                    None => {}
                }
            }
        }
    }

    /// Apply one input event, then deliver any history notifications it
    /// caused.
    pub fn handle(&mut self, input: LightboxInput) {
        match input {
            LightboxInput::Open(index) => {
                if let Err(err) = self.open(index) {
                    warn!(error = %err, "open rejected");
                }
            }
            LightboxInput::PointerDown { x } => self.gesture_start(x),
            LightboxInput::PointerMove { x } => {
                self.gesture_move(x);
            }
            LightboxInput::PointerUp { target } => {
                self.gesture_end(Some(target));
            }
            LightboxInput::PointerCancel => self.gesture_cancel(),
            LightboxInput::Click(target) => self.click(target),
            LightboxInput::Key(key) => self.key(key),
            LightboxInput::Back => self.history.back(),
            LightboxInput::Forward => self.history.forward(),
            LightboxInput::Resize { width } => self.set_viewport_width(width),
        }
        self.pump_history();
    }

    /// Cancel everything pending. No later call mutates state.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.sequencer.cancel(&mut self.timers);
        if let Some(ticket) = self.close_ticket.take() {
            self.timers.cancel(ticket);
        }
        self.gesture.reset();
        self.disposed = true;
        debug!(session = self.session, "lightbox disposed");
    }

    fn animate_to(&mut self, target: usize, direction: Direction) {
        let outcome = self.sequencer.animate_to(
            target,
            direction,
            self.catalog_len,
            self.session,
            &mut self.timers,
        );
        if outcome == Animate::Started {
            info!(from = ?self.active_index, to = target, ?direction, "navigation committed");
            self.gesture.reset();
            self.drag_offset = direction.exit_offset(self.viewport_width);
            self.motion = Motion::Ease(self.sequencer.phase_duration());
        }
    }

    fn revert(&mut self) {
        if self.status != Status::Open || self.sequencer.is_animating() {
            return;
        }
        self.drag_offset = 0.0;
        self.motion = Motion::Ease(self.sequencer.phase_duration());
    }

    /// The one place drag and animation state are torn down on close.
    fn close_transition(&mut self) {
        self.sequencer.cancel(&mut self.timers);
        self.gesture.reset();
        self.drag_offset = 0.0;
        self.motion = Motion::Immediate;
        self.status = Status::Closing;
        let ticket = self.sequencer.ticket(self.session, TimerKind::Close);
        self.timers.schedule(ticket, self.close_duration);
        self.close_ticket = Some(ticket);
        info!(session = self.session, index = ?self.active_index, "lightbox closing");
    }

    fn finish_close(&mut self) {
        self.close_ticket = None;
        self.status = Status::Closed;
        self.active_index = None;
        self.drag_offset = 0.0;
        self.motion = Motion::Immediate;
        self.bridge.clear();
        debug!(session = self.session, "lightbox closed");
    }
}
