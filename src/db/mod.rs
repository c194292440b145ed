mod connection;
mod helpers;
mod migrations;
mod repositories;
mod session_store;

pub use connection::{Database, WorkerUnavailable};
pub use repositories::stays::OpenOutcome;
