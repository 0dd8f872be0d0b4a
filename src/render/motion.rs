use std::time::{Duration, Instant};

use crate::events::Motion;

/// Ease-out cubic.
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Progress of a transition that started at `start`, in `0.0..=1.0`.
pub fn progress(start: Instant, duration: Duration, now: Instant) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(start);
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

/// Horizontal offset of the lightbox image as seen on screen.
///
/// The lightbox publishes target offsets with a [`Motion`]; this interpolates
/// from whatever was displayed to the new target.
#[derive(Debug, Clone, Copy)]
pub struct OffsetAnimator {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
}

impl OffsetAnimator {
    pub fn new(now: Instant) -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            start: now,
            duration: Duration::ZERO,
        }
    }

    pub fn retarget(&mut self, target: f32, motion: Motion, now: Instant) {
        let (from, duration) = match motion {
            Motion::Immediate => (target, Duration::ZERO),
            Motion::Ease(duration) => (self.value(now), duration),
            Motion::EnterFrom { from_px, duration } => (from_px, duration),
        };
        self.from = from;
        self.to = target;
        self.start = now;
        self.duration = duration;
    }

    pub fn value(&self, now: Instant) -> f32 {
        let t = ease_out(progress(self.start, self.duration, now));
        self.from + (self.to - self.from) * t
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        progress(self.start, self.duration, now) >= 1.0
    }
}
