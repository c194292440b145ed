use serde::{Deserialize, Serialize};

use crate::models::StableObservation;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VisitPhase {
    Idle,
    VisitActive,
}

impl Default for VisitPhase {
    fn default() -> Self {
        VisitPhase::Idle
    }
}

/// Which branch a detected vehicle went down. Exactly one per visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VisitOutcome {
    #[serde(rename_all = "camelCase")]
    Departure { session_id: String },
    #[serde(rename_all = "camelCase")]
    Opened { sector_name: String },
    NoCapacity,
    StorageFailure,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ControllerState {
    pub phase: VisitPhase,
    /// Set as soon as a visit triggers its one session action; cleared only by absence
    /// or a reset. Stable readings arriving while set are ignored.
    pub visit_already_handled: bool,
    pub current_visit: Option<StableObservation>,
    pub last_outcome: Option<VisitOutcome>,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_visit(&mut self, observation: StableObservation) {
        *self = Self {
            phase: VisitPhase::VisitActive,
            visit_already_handled: true,
            current_visit: Some(observation),
            last_outcome: None,
        };
    }

    pub fn record_outcome(&mut self, outcome: VisitOutcome) {
        self.last_outcome = Some(outcome);
    }

    pub fn end_visit(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.phase == VisitPhase::VisitActive
    }
}

/// Read-only view of the controller and its debounce counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub state: ControllerState,
    pub previous_observation: Option<StableObservation>,
    pub matching_sample_count: u32,
    pub samples_since_any_detection: u32,
}
