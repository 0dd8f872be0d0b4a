use std::time::Duration;

use photo_lightbox::config::LightboxConfig;
use photo_lightbox::error::{HistoryError, LightboxError};
use photo_lightbox::events::{HitTarget, Key, LightboxInput};
use photo_lightbox::lightbox::gesture::Release;
use photo_lightbox::lightbox::history::{Marker, NavigationStack, PopEvent, SessionHistory};
use photo_lightbox::lightbox::testkit::ManualTimers;
use photo_lightbox::lightbox::{Direction, Lightbox, Status};

const PHASE: Duration = Duration::from_millis(220);

type TestLightbox<H = SessionHistory> = Lightbox<H, ManualTimers>;

fn lightbox(len: usize) -> TestLightbox {
    lightbox_with(len, SessionHistory::default())
}

fn lightbox_with<H: NavigationStack>(len: usize, history: H) -> TestLightbox<H> {
    let mut lb = Lightbox::new(
        len,
        &LightboxConfig::default(),
        history,
        ManualTimers::default(),
    );
    lb.set_viewport_width(1000.0);
    lb
}

/// Press at `from`, move to `to` in 10 px steps, release over the image.
fn swipe<H: NavigationStack>(lb: &mut TestLightbox<H>, from: f32, to: f32) -> Option<Release> {
    lb.handle(LightboxInput::PointerDown { x: from });
    let steps = ((to - from).abs() / 10.0).ceil() as usize;
    for step in 1..=steps {
        let x = from + (to - from) * step as f32 / steps as f32;
        lb.handle(LightboxInput::PointerMove { x });
    }
    lb.gesture_end(Some(HitTarget::Image))
}

/// Navigation stack that counts how often the lightbox asks to go back.
#[derive(Default)]
struct CountingStack {
    inner: SessionHistory,
    backs: usize,
}

impl NavigationStack for CountingStack {
    fn push_marker(&mut self, marker: Marker) -> Result<(), HistoryError> {
        self.inner.push_marker(marker)
    }

    fn back(&mut self) {
        self.backs += 1;
        self.inner.back();
    }

    fn forward(&mut self) {
        self.inner.forward();
    }

    fn poll_pop(&mut self) -> Option<PopEvent> {
        self.inner.poll_pop()
    }
}

#[test]
fn open_shows_requested_image_at_rest() {
    for index in 0..4 {
        let mut lb = lightbox(4);
        lb.open(index).unwrap();
        let st = lb.state();
        assert_eq!(st.status, Status::Open);
        assert_eq!(st.active_index, Some(index));
        assert_eq!(st.drag_offset, 0.0);
        assert!(!st.is_dragging);
    }
}

#[test]
fn swipe_left_past_threshold_shows_next_image() {
    let mut lb = lightbox(3);
    lb.open(1).unwrap();
    let release = swipe(&mut lb, 500.0, 400.0);
    assert_eq!(release, Some(Release::Commit(Direction::Next)));
    assert!(lb.is_animating());

    lb.settle();
    let st = lb.state();
    assert_eq!(st.status, Status::Open);
    assert_eq!(st.active_index, Some(2));
    assert_eq!(st.drag_offset, 0.0);
    assert!(!lb.is_animating());
}

#[test]
fn swipe_right_past_threshold_shows_previous_image() {
    let mut lb = lightbox(3);
    lb.open(1).unwrap();
    assert_eq!(
        swipe(&mut lb, 200.0, 280.0),
        Some(Release::Commit(Direction::Previous))
    );
    lb.settle();
    assert_eq!(lb.state().active_index, Some(0));
    assert_eq!(lb.state().drag_offset, 0.0);
}

#[test]
fn drags_within_commit_threshold_revert() {
    for delta in [0.0, 4.0, -10.0, 35.0, -69.0, 70.0, -70.0] {
        let mut lb = lightbox(3);
        lb.open(1).unwrap();
        let release = swipe(&mut lb, 500.0, 500.0 + delta);
        assert!(
            matches!(release, Some(Release::Tap | Release::Revert)),
            "delta {delta} released as {release:?}"
        );
        lb.settle();
        let st = lb.state();
        assert_eq!(st.active_index, Some(1), "delta {delta}");
        assert_eq!(st.drag_offset, 0.0, "delta {delta}");
        assert_eq!(st.status, Status::Open, "delta {delta}");
    }
}

#[test]
fn tap_on_image_neither_navigates_nor_closes() {
    let mut lb = lightbox(3);
    lb.open(1).unwrap();
    assert_eq!(swipe(&mut lb, 400.0, 406.0), Some(Release::Tap));
    lb.pump_history();
    assert_eq!(lb.state().status, Status::Open);
    assert_eq!(lb.state().active_index, Some(1));
    assert_eq!(lb.history().depth(), 2);
}

#[test]
fn left_arrow_at_first_image_is_a_noop() {
    let mut lb = lightbox(3);
    lb.open(0).unwrap();
    lb.handle(LightboxInput::Key(Key::ArrowLeft));
    assert_eq!(lb.state().active_index, Some(0));
    assert!(!lb.is_animating());
    assert_eq!(lb.timers().pending(), 0);
}

#[test]
fn next_at_last_image_is_a_noop_for_every_input() {
    let mut lb = lightbox(3);
    lb.open(2).unwrap();

    lb.handle(LightboxInput::Key(Key::ArrowRight));
    lb.handle(LightboxInput::Click(HitTarget::NextArrow));
    assert_eq!(swipe(&mut lb, 600.0, 400.0), Some(Release::Revert));
    lb.commit_navigate(Direction::Next);

    assert_eq!(lb.timers().pending(), 0);
    lb.settle();
    assert_eq!(lb.state().active_index, Some(2));
    assert_eq!(lb.state().drag_offset, 0.0);
}

#[test]
fn commit_during_animation_is_dropped() {
    let mut lb = lightbox(5);
    lb.open(0).unwrap();
    lb.handle(LightboxInput::Key(Key::ArrowRight));
    lb.advance(PHASE / 2);
    lb.handle(LightboxInput::Key(Key::ArrowRight));
    lb.handle(LightboxInput::Click(HitTarget::NextArrow));
    lb.settle();
    assert_eq!(lb.state().active_index, Some(1));
}

#[test]
fn drag_is_ignored_while_animating() {
    let mut lb = lightbox(3);
    lb.open(0).unwrap();
    lb.handle(LightboxInput::Key(Key::ArrowRight));
    let during = lb.state().drag_offset;
    lb.handle(LightboxInput::PointerDown { x: 100.0 });
    lb.handle(LightboxInput::PointerMove { x: 300.0 });
    assert_eq!(lb.state().drag_offset, during);
    lb.handle(LightboxInput::PointerUp {
        target: HitTarget::Image,
    });
    lb.settle();
    assert_eq!(lb.state().active_index, Some(1));
    assert_eq!(lb.state().drag_offset, 0.0);
}

#[test]
fn press_held_through_a_slide_cannot_commit_again() {
    let mut lb = lightbox(5);
    lb.open(1).unwrap();
    lb.handle(LightboxInput::Key(Key::ArrowRight));
    lb.handle(LightboxInput::PointerDown { x: 500.0 });
    assert!(!lb.state().is_dragging);
    lb.handle(LightboxInput::PointerMove { x: 300.0 });
    lb.settle();
    assert_eq!(lb.state().active_index, Some(2));

    lb.handle(LightboxInput::PointerMove { x: 301.0 });
    assert_eq!(lb.state().drag_offset, 0.0);
    assert!(!lb.state().is_dragging);
    lb.handle(LightboxInput::PointerUp {
        target: HitTarget::Image,
    });
    assert!(!lb.is_animating());
    lb.settle();
    assert_eq!(lb.state().active_index, Some(2));
    assert_eq!(lb.state().drag_offset, 0.0);
}

#[test]
fn drag_follows_pointer_and_claims_past_jitter() {
    let mut lb = lightbox(3);
    lb.open(1).unwrap();
    lb.gesture_start(300.0);
    assert!(lb.state().is_dragging);
    assert!(!lb.gesture_move(306.0));
    assert_eq!(lb.state().drag_offset, 6.0);
    assert!(!lb.frame().gesture_claimed);
    assert!(lb.gesture_move(340.0));
    assert_eq!(lb.state().drag_offset, 40.0);
    assert!(lb.frame().gesture_claimed);
    // stays claimed even when the finger comes back
    assert!(lb.gesture_move(302.0));
}

#[test]
fn every_close_path_restores_stack_depth() {
    let closers: [(&str, &[LightboxInput]); 5] = [
        ("escape", &[LightboxInput::Key(Key::Escape)]),
        ("close button", &[LightboxInput::Click(HitTarget::CloseButton)]),
        (
            "backdrop tap",
            &[
                LightboxInput::PointerDown { x: 5.0 },
                LightboxInput::PointerUp {
                    target: HitTarget::Backdrop,
                },
            ],
        ),
        ("platform back", &[LightboxInput::Back]),
        (
            "escape mid-animation",
            &[
                LightboxInput::Key(Key::ArrowRight),
                LightboxInput::Key(Key::Escape),
            ],
        ),
    ];
    for (name, inputs) in closers {
        let mut lb = lightbox(3);
        lb.open(1).unwrap();
        assert_eq!(lb.history().depth(), 2, "{name}");
        for input in inputs {
            lb.handle(*input);
        }
        assert_eq!(lb.state().status, Status::Closing, "{name}");
        assert!(!lb.is_animating(), "{name}");
        lb.settle();
        let st = lb.state();
        assert_eq!(st.status, Status::Closed, "{name}");
        assert_eq!(st.active_index, None, "{name}");
        assert!(!st.history_token, "{name}");
        assert_eq!(lb.history().depth(), 1, "{name}");
    }
}

#[test]
fn repeated_close_requests_navigate_back_once() {
    let mut lb = lightbox_with(3, CountingStack::default());
    lb.open(0).unwrap();
    lb.key(Key::Escape);
    lb.click(HitTarget::CloseButton);
    lb.key(Key::Escape);
    assert_eq!(lb.history().backs, 1);
    lb.pump_history();
    lb.settle();
    assert_eq!(lb.state().status, Status::Closed);
    assert_eq!(lb.history().inner.depth(), 1);
    // a later session navigates back again
    lb.open(1).unwrap();
    lb.handle(LightboxInput::Key(Key::Escape));
    assert_eq!(lb.history().backs, 2);
}

#[test]
fn reopening_never_stacks_markers() {
    let mut lb = lightbox(4);
    for round in 0..5 {
        lb.open(round % 4).unwrap();
        lb.open((round + 1) % 4).unwrap();
        assert_eq!(lb.history().depth(), 2);
        lb.handle(LightboxInput::Key(Key::Escape));
        lb.settle();
        assert_eq!(lb.history().depth(), 1);
    }
}

#[test]
fn foreign_pop_closes_exactly_once() {
    let mut lb = lightbox(3);
    lb.open(1).unwrap();
    assert!(lb.state().history_token);

    lb.on_history_pop(None);
    let st = lb.state();
    assert_eq!(st.status, Status::Closing);
    assert!(!st.history_token);
    assert_eq!(lb.timers().pending(), 1);

    lb.on_history_pop(None);
    assert_eq!(lb.timers().pending(), 1);
    lb.settle();
    assert_eq!(lb.state().status, Status::Closed);

    // a close while closed does not navigate back
    lb.handle(LightboxInput::Key(Key::Escape));
    assert_eq!(lb.history().depth(), 2);
}

#[test]
fn stale_marker_from_earlier_session_closes() {
    let mut lb = lightbox(3);
    lb.open(1).unwrap();
    lb.on_history_pop(Some(Marker {
        session: 0,
        index: 2,
    }));
    assert_eq!(lb.state().status, Status::Closing);
}

#[test]
fn own_marker_pop_is_ignored() {
    let mut lb = lightbox(3);
    lb.open(1).unwrap();
    let own = lb.history().current().copied();
    assert!(own.is_some());
    lb.on_history_pop(own);
    assert_eq!(lb.state().status, Status::Open);
    assert!(lb.state().history_token);
}

#[test]
fn forward_onto_old_marker_does_not_reopen() {
    let mut lb = lightbox(3);
    lb.open(1).unwrap();
    lb.handle(LightboxInput::Key(Key::Escape));
    lb.settle();
    lb.handle(LightboxInput::Forward);
    assert_eq!(lb.state().status, Status::Closed);
    assert_eq!(lb.history().depth(), 2);

    // opening again replaces the forward entry
    lb.open(2).unwrap();
    assert_eq!(lb.history().len(), lb.history().depth());
}

#[test]
fn refused_push_closes_locally() {
    for history in [SessionHistory::new(false, 64), SessionHistory::new(true, 1)] {
        let mut lb = lightbox_with(3, history);
        lb.open(1).unwrap();
        assert!(!lb.state().history_token);
        lb.key(Key::Escape);
        assert_eq!(lb.state().status, Status::Closing);
        lb.settle();
        assert_eq!(lb.state().status, Status::Closed);
        assert_eq!(lb.history().depth(), 1);
    }
}

#[test]
fn open_is_ignored_while_closing() {
    let mut lb = lightbox(3);
    lb.open(0).unwrap();
    lb.handle(LightboxInput::Key(Key::Escape));
    lb.open(2).unwrap();
    assert_eq!(lb.state().status, Status::Closing);
    assert_eq!(lb.state().active_index, Some(0));
    lb.settle();
    lb.open(2).unwrap();
    assert_eq!(lb.state().active_index, Some(2));
}

#[test]
fn empty_catalog_never_opens() {
    let mut lb = lightbox(0);
    assert_eq!(lb.open(0), Err(LightboxError::EmptyCatalog));
    lb.handle(LightboxInput::Open(0));
    lb.handle(LightboxInput::Key(Key::ArrowRight));
    lb.handle(LightboxInput::PointerDown { x: 10.0 });
    let st = lb.state();
    assert_eq!(st.status, Status::Closed);
    assert_eq!(st.active_index, None);
    assert!(!st.is_dragging);
    assert_eq!(lb.history().depth(), 1);
}

#[test]
fn input_while_closed_is_ignored() {
    let mut lb = lightbox(3);
    lb.handle(LightboxInput::PointerDown { x: 0.0 });
    lb.handle(LightboxInput::PointerMove { x: -200.0 });
    lb.handle(LightboxInput::PointerUp {
        target: HitTarget::Image,
    });
    lb.handle(LightboxInput::Key(Key::ArrowRight));
    lb.handle(LightboxInput::Key(Key::Escape));
    let st = lb.state();
    assert_eq!(st.status, Status::Closed);
    assert_eq!(st.drag_offset, 0.0);
    assert!(!st.is_dragging);
    assert_eq!(lb.timers().pending(), 0);
}
