use std::{
    collections::{HashSet, VecDeque},
    future::Future,
    time::Duration,
};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    models::{FrameObservation, StableObservation},
    presentation::{ExitView, MessageCode, PresentationEvent, PresentationSink},
    sensing::{DebounceConfig, DebounceFilter, FilterEvent},
    store::{SessionStore, StorageError},
};

use super::{ControllerSnapshot, ControllerState, VisitOutcome};

/// Exit screens that stay payable after the vehicle has left. The oldest is
/// dropped when a new one would exceed this.
const MAX_PENDING_EXITS: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub debounce: DebounceConfig,
    /// Upper bound for any single store call; expiry counts as a storage failure.
    pub storage_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: DebounceConfig::default(),
            storage_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PaymentOutcome {
    Settled,
    /// Unknown or already settled session; the store was not called.
    Rejected,
    /// The finish call failed; the session stays open for manual reconciliation.
    Failed,
}

/// Owns the debounce filter and the visit state for one lane and decides, once
/// per visit, between arrival and departure.
pub struct SessionController<S, P> {
    store: S,
    sink: P,
    filter: DebounceFilter,
    state: ControllerState,
    storage_timeout: Duration,
    awaiting_payment: VecDeque<ExitView>,
    settled: HashSet<String>,
}

impl<S: SessionStore, P: PresentationSink> SessionController<S, P> {
    pub fn new(store: S, sink: P, config: ControllerConfig) -> Self {
        Self {
            store,
            sink,
            filter: DebounceFilter::new(config.debounce),
            state: ControllerState::new(),
            storage_timeout: config.storage_timeout,
            awaiting_payment: VecDeque::new(),
            settled: HashSet::new(),
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state.clone(),
            previous_observation: self.filter.previous_observation().cloned(),
            matching_sample_count: self.filter.matching_sample_count(),
            samples_since_any_detection: self.filter.samples_since_any_detection(),
        }
    }

    /// Runs one tick to completion: debounce, then at most one session action.
    pub async fn process_frame(&mut self, frame: &FrameObservation) -> FilterEvent {
        let event = self.filter.observe(frame);
        self.handle_event(event.clone()).await;
        event
    }

    pub async fn handle_event(&mut self, event: FilterEvent) {
        match event {
            FilterEvent::None => {}
            FilterEvent::Stable(observation) => {
                if self.state.visit_already_handled {
                    if self.state.current_visit.as_ref() != Some(&observation) {
                        warn!(
                            "Ignoring {} ({}) until the current visit ends",
                            observation.plate_text,
                            observation.vehicle_class.as_str()
                        );
                    }
                    return;
                }

                self.state.begin_visit(observation.clone());
                let outcome = self.on_vehicle_detected(&observation).await;
                debug!("Visit for {} resolved as {:?}", observation.plate_text, outcome);
                self.state.record_outcome(outcome);
            }
            FilterEvent::Absent => {
                if !self.state.is_active() {
                    return;
                }
                if let Some(visit) = &self.state.current_visit {
                    info!("Vehicle {} left the lane", visit.plate_text);
                }
                self.state.end_visit();
                self.sink.present(PresentationEvent::ShowIdle);
            }
        }
    }

    async fn on_vehicle_detected(&mut self, observation: &StableObservation) -> VisitOutcome {
        let lookup = with_timeout(
            self.storage_timeout,
            self.store.lookup_open_session(&observation.plate_text),
        )
        .await;

        match lookup {
            Ok(Some(session)) => {
                info!(
                    "Departure of {}: session {} open for {}s",
                    session.plate_text, session.id, session.duration_secs
                );
                let view = ExitView {
                    session_id: session.id.clone(),
                    vehicle_class: session.vehicle_class,
                    plate_text: session.plate_text,
                    tariff_per_hour: session.tariff_per_hour,
                    duration_secs: session.duration_secs,
                };
                self.await_payment(view.clone());
                self.sink.present(PresentationEvent::ShowExit(view));
                VisitOutcome::Departure {
                    session_id: session.id,
                }
            }
            Ok(None) => self.open_session(observation).await,
            Err(err) => self.storage_failure("lookup", observation, err),
        }
    }

    async fn open_session(&mut self, observation: &StableObservation) -> VisitOutcome {
        let opened = with_timeout(
            self.storage_timeout,
            self.store
                .open_session(observation.vehicle_class, &observation.plate_text),
        )
        .await;

        match opened {
            Ok(Some(assignment)) => {
                info!(
                    "Arrival of {} ({}): sector {}",
                    observation.plate_text,
                    observation.vehicle_class.as_str(),
                    assignment.sector_name
                );
                self.sink.present(PresentationEvent::ShowWelcome {
                    vehicle_class: observation.vehicle_class,
                    plate_text: observation.plate_text.clone(),
                    sector_name: assignment.sector_name.clone(),
                });
                VisitOutcome::Opened {
                    sector_name: assignment.sector_name,
                }
            }
            Ok(None) => {
                info!(
                    "No free sector for {} ({})",
                    observation.plate_text,
                    observation.vehicle_class.as_str()
                );
                self.sink.present(PresentationEvent::ShowNoCapacity {
                    vehicle_class: observation.vehicle_class,
                });
                VisitOutcome::NoCapacity
            }
            Err(err) => self.storage_failure("open", observation, err),
        }
    }

    fn storage_failure(
        &self,
        operation: &str,
        observation: &StableObservation,
        err: StorageError,
    ) -> VisitOutcome {
        error!(
            "Storage {} failed for {}: {}; visit stays handled until the vehicle leaves",
            operation, observation.plate_text, err
        );
        self.sink.present(PresentationEvent::ShowMessage {
            code: MessageCode::GeneralError,
        });
        VisitOutcome::StorageFailure
    }

    /// Closes the session shown on the exit screen. The finish call is issued at
    /// most once per session id over the controller's lifetime.
    pub async fn confirm_payment(&mut self, session_id: &str) -> PaymentOutcome {
        if self.settled.contains(session_id) {
            warn!("Session {} was already settled, refusing to finish it again", session_id);
            self.present_message(MessageCode::PaymentUnsuccessful);
            return PaymentOutcome::Rejected;
        }
        let Some(view) = self.take_pending(session_id) else {
            warn!("Payment confirmed for session {} that is not awaiting payment", session_id);
            self.present_message(MessageCode::PaymentUnsuccessful);
            return PaymentOutcome::Rejected;
        };

        self.settled.insert(session_id.to_string());
        let amount = view.amount_due();
        let finished = with_timeout(
            self.storage_timeout,
            self.store
                .finish_session(session_id, view.duration_secs, amount),
        )
        .await;

        match finished {
            Ok(()) => {
                info!(
                    "Session {} finished after {}s, paid {}",
                    session_id, view.duration_secs, amount
                );
                self.present_message(MessageCode::PaymentSuccessful);
                PaymentOutcome::Settled
            }
            Err(err) => {
                error!(
                    "Failed to finish session {} ({} due): {}; left open for manual reconciliation",
                    session_id, amount, err
                );
                self.present_message(MessageCode::GeneralError);
                PaymentOutcome::Failed
            }
        }
    }

    /// The terminal declined the payment; the session stays payable.
    pub fn report_payment_failure(&mut self, session_id: &str) {
        warn!("Payment for session {} was declined", session_id);
        self.present_message(MessageCode::PaymentUnsuccessful);
    }

    /// Returns visit state and debounce counters to their initial values and
    /// forgets unpaid exit screens. Settled session ids survive so a session
    /// can never be finished twice.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.state = ControllerState::new();
        self.awaiting_payment.clear();
        info!("Controller state reset");
    }

    fn await_payment(&mut self, view: ExitView) {
        self.awaiting_payment
            .retain(|pending| pending.session_id != view.session_id);
        if self.awaiting_payment.len() >= MAX_PENDING_EXITS {
            if let Some(dropped) = self.awaiting_payment.pop_front() {
                warn!(
                    "Session {} ({}) left unpaid, no longer accepting payment for it here",
                    dropped.session_id, dropped.plate_text
                );
            }
        }
        self.awaiting_payment.push_back(view);
    }

    fn take_pending(&mut self, session_id: &str) -> Option<ExitView> {
        let index = self
            .awaiting_payment
            .iter()
            .position(|pending| pending.session_id == session_id)?;
        self.awaiting_payment.remove(index)
    }

    fn present_message(&self, code: MessageCode) {
        self.sink.present(PresentationEvent::ShowMessage { code });
    }
}

async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(limit.as_millis() as u64)),
    }
}
