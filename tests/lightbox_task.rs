use std::time::Duration;

use photo_lightbox::config::{HistoryConfig, LightboxConfig};
use photo_lightbox::events::{Frame, HitTarget, Key, LightboxInput, Motion};
use photo_lightbox::lightbox::Status;
use photo_lightbox::tasks::lightbox::run;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

struct Harness {
    inputs: mpsc::Sender<LightboxInput>,
    frames: mpsc::Receiver<Frame>,
    cancel: CancellationToken,
    handle: JoinHandle<anyhow::Result<()>>,
}

fn spawn(catalog_len: usize, history: HistoryConfig) -> Harness {
    let (inputs, input_rx) = mpsc::channel(32);
    let (frame_tx, frames) = mpsc::channel(64);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run(
        input_rx,
        frame_tx,
        cancel.clone(),
        catalog_len,
        LightboxConfig::default(),
        history,
    ));
    Harness {
        inputs,
        frames,
        cancel,
        handle,
    }
}

impl Harness {
    async fn send(&self, input: LightboxInput) {
        self.inputs.send(input).await.unwrap();
    }

    /// Next frame satisfying `pred`, skipping intermediate ones.
    async fn frame_where(&mut self, pred: impl Fn(&Frame) -> bool) -> Frame {
        timeout(Duration::from_secs(5), async {
            loop {
                let frame = self.frames.recv().await.expect("lightbox task exited");
                if pred(&frame) {
                    return frame;
                }
            }
        })
        .await
        .expect("no matching frame")
    }

    async fn shutdown(self) {
        self.cancel.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn publishes_closed_frame_first() {
    let mut h = spawn(3, HistoryConfig::default());
    let first = h.frame_where(|_| true).await;
    assert_eq!(first, Frame::closed(3));
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn swipe_animates_to_next_image() {
    let mut h = spawn(3, HistoryConfig::default());
    h.send(LightboxInput::Resize { width: 800.0 }).await;
    h.send(LightboxInput::Open(1)).await;
    h.frame_where(|f| f.status == Status::Open).await;

    h.send(LightboxInput::PointerDown { x: 500.0 }).await;
    h.send(LightboxInput::PointerMove { x: 450.0 }).await;
    let dragging = h.frame_where(|f| f.offset_px == -50.0).await;
    assert!(dragging.gesture_claimed);
    h.send(LightboxInput::PointerMove { x: 400.0 }).await;
    h.send(LightboxInput::PointerUp {
        target: HitTarget::Image,
    })
    .await;

    let leaving = h.frame_where(|f| f.offset_px == -800.0).await;
    assert_eq!(leaving.active_index, Some(1));
    assert!(matches!(leaving.motion, Motion::Ease(_)));

    let entering = h.frame_where(|f| f.active_index == Some(2)).await;
    assert_eq!(entering.offset_px, 0.0);
    assert_eq!(entering.status, Status::Open);
    assert!(matches!(
        entering.motion,
        Motion::EnterFrom { from_px, .. } if from_px == 800.0
    ));
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn escape_fades_out_then_closes() {
    let mut h = spawn(2, HistoryConfig::default());
    h.send(LightboxInput::Open(0)).await;
    h.frame_where(|f| f.status == Status::Open).await;

    h.send(LightboxInput::Key(Key::Escape)).await;
    let closing = h.frame_where(|f| f.status != Status::Open).await;
    assert_eq!(closing.status, Status::Closing);
    let closed = h.frame_where(|f| f.status == Status::Closed).await;
    assert_eq!(closed.active_index, None);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn closes_without_history_support() {
    let mut h = spawn(
        2,
        HistoryConfig {
            enabled: false,
            max_depth: 64,
        },
    );
    h.send(LightboxInput::Open(1)).await;
    h.send(LightboxInput::Click(HitTarget::CloseButton)).await;
    h.frame_where(|f| f.status == Status::Closing).await;
    h.frame_where(|f| f.status == Status::Closed).await;
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_animation_publishes_nothing_further() {
    let mut h = spawn(3, HistoryConfig::default());
    h.send(LightboxInput::Open(0)).await;
    h.send(LightboxInput::Key(Key::ArrowRight)).await;
    h.frame_where(|f| f.offset_px < 0.0).await;

    h.cancel.cancel();
    h.handle.await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    while let Ok(frame) = h.frames.try_recv() {
        assert_ne!(frame.active_index, Some(1), "timer fired after shutdown");
    }
}
