use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::info;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    presentation::PresentationSink,
    sensing::{capture_loop, DetectionSampler, Detector, LaneMessage},
    store::SessionStore,
};

use super::SessionController;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy)]
pub struct LaneConfig {
    pub tick_interval: Duration,
    pub queue_capacity: usize,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(30),
            queue_capacity: 64,
        }
    }
}

struct CaptureTask {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// One physical lane: a capture task feeding a single control task that owns
/// the `SessionController`. All controller mutations happen on the control task.
pub struct LaneController<S, P> {
    config: LaneConfig,
    sender: mpsc::Sender<LaneMessage>,
    control: JoinHandle<SessionController<S, P>>,
    capture: Option<CaptureTask>,
    latest_generation: Arc<AtomicU64>,
}

impl<S, P> LaneController<S, P>
where
    S: SessionStore + 'static,
    P: PresentationSink + 'static,
{
    pub fn start(controller: SessionController<S, P>, config: LaneConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let latest_generation = Arc::new(AtomicU64::new(0));
        let control = tokio::spawn(control_loop(
            controller,
            receiver,
            latest_generation.clone(),
        ));

        Self {
            config,
            sender,
            control,
            capture: None,
            latest_generation,
        }
    }

    /// Replaces the frame source. Frames already queued from the previous source
    /// are discarded and the controller is reset before the new source's first frame.
    pub async fn switch_source<D>(&mut self, sampler: DetectionSampler<D>) -> Result<()>
    where
        D: Detector + 'static,
    {
        self.stop_capture().await?;

        let generation = self.latest_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.sender
            .send(LaneMessage::Reset { generation })
            .await
            .map_err(|_| anyhow!("lane control task is gone"))?;

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(capture_loop(
            sampler,
            generation,
            self.sender.clone(),
            self.config.tick_interval,
            cancel_token.clone(),
        ));
        self.capture = Some(CaptureTask {
            handle,
            cancel_token,
        });

        info!("Lane switched to source {}", generation);
        Ok(())
    }

    /// Waits for the current source to run out of frames.
    pub async fn wait_for_source(&mut self) -> Result<()> {
        if let Some(task) = self.capture.take() {
            task.handle
                .await
                .context("capture task failed to join")?;
        }
        Ok(())
    }

    pub async fn confirm_payment(&self, session_id: &str) -> Result<()> {
        self.send(LaneMessage::ConfirmPayment(session_id.to_string()))
            .await
    }

    pub async fn report_payment_failure(&self, session_id: &str) -> Result<()> {
        self.send(LaneMessage::PaymentDeclined(session_id.to_string()))
            .await
    }

    /// Cancels capture, lets the control task drain the queue, and hands the
    /// controller back.
    pub async fn stop(mut self) -> Result<SessionController<S, P>> {
        self.stop_capture().await?;
        drop(self.sender);
        self.control
            .await
            .context("lane control task failed to join")
    }

    async fn send(&self, message: LaneMessage) -> Result<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| anyhow!("lane control task is gone"))
    }

    async fn stop_capture(&mut self) -> Result<()> {
        if let Some(task) = self.capture.take() {
            task.cancel_token.cancel();
            task.handle
                .await
                .context("capture task failed to join")?;
        }
        Ok(())
    }
}

async fn control_loop<S, P>(
    mut controller: SessionController<S, P>,
    mut receiver: mpsc::Receiver<LaneMessage>,
    latest_generation: Arc<AtomicU64>,
) -> SessionController<S, P>
where
    S: SessionStore,
    P: PresentationSink,
{
    let mut stale_frames: u64 = 0;

    while let Some(message) = receiver.recv().await {
        match message {
            LaneMessage::Frame {
                generation,
                observation,
            } => {
                if generation != latest_generation.load(Ordering::SeqCst) {
                    stale_frames += 1;
                    continue;
                }
                controller.process_frame(&observation).await;
            }
            LaneMessage::Reset { generation } => {
                if stale_frames > 0 {
                    log_info!("dropped {} frames from replaced sources", stale_frames);
                    stale_frames = 0;
                }
                log_info!("resetting controller for source {}", generation);
                controller.reset();
            }
            LaneMessage::ConfirmPayment(session_id) => {
                let outcome = controller.confirm_payment(&session_id).await;
                if outcome != super::PaymentOutcome::Settled {
                    log_warn!("payment for session {} ended as {:?}", session_id, outcome);
                }
            }
            LaneMessage::PaymentDeclined(session_id) => {
                controller.report_payment_failure(&session_id);
            }
        }
    }

    log_info!("lane control loop shutting down");
    controller
}
