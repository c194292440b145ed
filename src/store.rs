//! Persistent-storage contract used by the session controller.
//!
//! Business outcomes (no open session, no free sector) are ordinary return
//! values; only faults are `StorageError`.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Money, SectorAssignment, SectorDescriptor, Session, VehicleClass};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage call timed out after {0} ms")]
    Timeout(u64),

    #[error("plate {0} already has an open session")]
    Conflict(String),

    #[error("session {0} not found or already finished")]
    NotFound(String),

    #[error("storage query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when the plate has no open session.
    async fn lookup_open_session(&self, plate_text: &str) -> Result<Option<Session>, StorageError>;

    /// Reserves exactly one sector for the plate, or returns `Ok(None)` when
    /// no sector for `vehicle_class` has room.
    async fn open_session(
        &self,
        vehicle_class: VehicleClass,
        plate_text: &str,
    ) -> Result<Option<SectorAssignment>, StorageError>;

    /// Not idempotent: call at most once per session. On error the session
    /// stays open.
    async fn finish_session(
        &self,
        session_id: &str,
        duration_secs: u64,
        amount_due: Money,
    ) -> Result<(), StorageError>;

    async fn list_sectors(&self) -> Result<Vec<SectorDescriptor>, StorageError>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    async fn lookup_open_session(&self, plate_text: &str) -> Result<Option<Session>, StorageError> {
        (**self).lookup_open_session(plate_text).await
    }

    async fn open_session(
        &self,
        vehicle_class: VehicleClass,
        plate_text: &str,
    ) -> Result<Option<SectorAssignment>, StorageError> {
        (**self).open_session(vehicle_class, plate_text).await
    }

    async fn finish_session(
        &self,
        session_id: &str,
        duration_secs: u64,
        amount_due: Money,
    ) -> Result<(), StorageError> {
        (**self).finish_session(session_id, duration_secs, amount_due).await
    }

    async fn list_sectors(&self) -> Result<Vec<SectorDescriptor>, StorageError> {
        (**self).list_sectors().await
    }
}
