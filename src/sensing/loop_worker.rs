use tokio::{
    sync::mpsc,
    time::{Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::models::FrameObservation;

use super::sampler::{DetectionSampler, Detector};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Message handed from the capture task to the lane's control task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneMessage {
    Frame {
        generation: u64,
        observation: FrameObservation,
    },
    /// Sent once per source switch, before any frame of the new source.
    Reset { generation: u64 },
    ConfirmPayment(String),
    PaymentDeclined(String),
}

/// Pulls one observation per tick and queues it for the control task. Ends when
/// the source is exhausted, the queue closes, or `cancel_token` fires.
pub async fn capture_loop<D>(
    mut sampler: DetectionSampler<D>,
    generation: u64,
    frames: mpsc::Sender<LaneMessage>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
) where
    D: Detector + 'static,
{
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut frame_count: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel_token.cancelled() => {
                log_info!("capture loop for source {} cancelled after {} frames", generation, frame_count);
                return;
            }
        }

        // Detector calls are blocking (inference, file IO); run them off the runtime threads.
        let sampled = tokio::task::spawn_blocking(move || {
            let result = sampler.next_observation();
            (sampler, result)
        })
        .await;

        let observation = match sampled {
            Ok((returned, result)) => {
                sampler = returned;
                match result {
                    Ok(Some(observation)) => observation,
                    Ok(None) => {
                        log_info!("source {} exhausted after {} frames", generation, frame_count);
                        return;
                    }
                    Err(err) => {
                        log_warn!("detector failed on source {}: {err:#}; treating tick as empty", generation);
                        FrameObservation::empty()
                    }
                }
            }
            Err(join_err) => {
                log_error!("detector worker for source {} panicked: {join_err}", generation);
                return;
            }
        };

        frame_count += 1;
        let message = LaneMessage::Frame {
            generation,
            observation,
        };

        tokio::select! {
            sent = frames.send(message) => {
                if sent.is_err() {
                    log_warn!("frame queue closed, stopping capture for source {}", generation);
                    return;
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("capture loop for source {} cancelled after {} frames", generation, frame_count);
                return;
            }
        }
    }
}
