use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{self, Receiver, Sender, UnboundedSender};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{HistoryConfig, LightboxConfig};
use crate::events::{Frame, LightboxInput};
use crate::lightbox::Lightbox;
use crate::lightbox::history::SessionHistory;
use crate::lightbox::sequencer::{Ticket, Timers};

/// Timers backed by tokio sleeps.
///
/// Every ticket gets a child of `root`; cancelling the ticket, or dropping
/// the timers, cancels the sleep before it can report back.
pub struct TokioTimers {
    fired: UnboundedSender<Ticket>,
    root: CancellationToken,
    live: HashMap<Ticket, CancellationToken>,
}

impl TokioTimers {
    pub fn new(fired: UnboundedSender<Ticket>, root: CancellationToken) -> Self {
        Self {
            fired,
            root,
            live: HashMap::new(),
        }
    }

    /// Mark `ticket` as delivered. Returns `false` if it was cancelled in the
    /// meantime and must not be dispatched.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        self.live.remove(&ticket).is_some()
    }

    pub fn pending(&self) -> usize {
        self.live.len()
    }
}

impl Timers for TokioTimers {
    fn schedule(&mut self, ticket: Ticket, after: Duration) {
        let token = self.root.child_token();
        self.live.insert(ticket, token.clone());
        let fired = self.fired.clone();
        tokio::spawn(async move {
            select! {
                _ = token.cancelled() => {}
                _ = sleep(after) => {
                    let _ = fired.send(ticket);
                }
            }
        });
    }

    fn cancel(&mut self, ticket: Ticket) {
        if let Some(token) = self.live.remove(&ticket) {
            token.cancel();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// Owns the lightbox for the lifetime of the window.
///
/// Inputs are applied in arrival order; timer completions are fed back
/// through the same loop so nothing mutates the state concurrently. A frame
/// is sent whenever the rendered state changes.
#[instrument(skip_all, fields(catalog_len = catalog_len))]
pub async fn run(
    mut inputs: Receiver<LightboxInput>,
    frames: Sender<Frame>,
    cancel: CancellationToken,
    catalog_len: usize,
    cfg: LightboxConfig,
    history_cfg: HistoryConfig,
) -> Result<()> {
    let (fired_tx, mut fired_rx) = mpsc::unbounded_channel::<Ticket>();
    let timers = TokioTimers::new(fired_tx, cancel.child_token());
    let history = SessionHistory::new(history_cfg.enabled, history_cfg.max_depth);
    let mut lightbox = Lightbox::new(catalog_len, &cfg, history, timers);

    let mut last = lightbox.frame();
    if frames.send(last).await.is_err() {
        return Ok(());
    }

    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting lightbox task");
                break;
            }

            maybe_input = inputs.recv() => match maybe_input {
                Some(input) => {
                    debug!(?input, "lightbox input");
                    lightbox.handle(input);
                }
                None => {
                    debug!("input channel closed; exiting lightbox task");
                    break;
                }
            },

            Some(ticket) = fired_rx.recv() => {
                if lightbox.timers_mut().settle(ticket) {
                    lightbox.on_timer(ticket);
                    lightbox.pump_history();
                } else {
                    debug!(?ticket, "cancelled timer delivered late; dropped");
                }
            }
        }

        let frame = lightbox.frame();
        if frame != last {
            if frames.send(frame).await.is_err() {
                warn!("frame receiver closed");
                break;
            }
            last = frame;
        }
    }

    lightbox.dispose();
    Ok(())
}
