pub mod controller;
pub mod lane;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{ControllerConfig, PaymentOutcome, SessionController};
pub use lane::{LaneConfig, LaneController};
pub use state::{ControllerSnapshot, ControllerState, VisitOutcome, VisitPhase};
