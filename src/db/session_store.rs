use async_trait::async_trait;
use chrono::Utc;

use super::{
    connection::{Database, WorkerUnavailable},
    repositories::stays::OpenOutcome,
};
use crate::{
    models::{Money, SectorAssignment, SectorDescriptor, Session, VehicleClass},
    store::{SessionStore, StorageError},
};

/// A dead worker is a connectivity fault; anything else went wrong in SQL.
fn storage_fault(err: anyhow::Error) -> StorageError {
    if err.downcast_ref::<WorkerUnavailable>().is_some() {
        StorageError::Unavailable(err.to_string())
    } else {
        StorageError::Query(format!("{err:#}"))
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn lookup_open_session(&self, plate_text: &str) -> Result<Option<Session>, StorageError> {
        self.lookup_open_stay(plate_text, Utc::now())
            .await
            .map_err(storage_fault)
    }

    async fn open_session(
        &self,
        vehicle_class: VehicleClass,
        plate_text: &str,
    ) -> Result<Option<SectorAssignment>, StorageError> {
        let outcome = self
            .open_stay(vehicle_class, plate_text, Utc::now())
            .await
            .map_err(storage_fault)?;
        match outcome {
            OpenOutcome::Assigned(assignment) => Ok(Some(assignment)),
            OpenOutcome::NoCapacity => Ok(None),
            OpenOutcome::AlreadyOpen => Err(StorageError::Conflict(plate_text.to_string())),
        }
    }

    async fn finish_session(
        &self,
        session_id: &str,
        duration_secs: u64,
        amount_due: Money,
    ) -> Result<(), StorageError> {
        let finished = self
            .finish_stay(session_id, duration_secs, amount_due, Utc::now())
            .await
            .map_err(storage_fault)?;
        if finished {
            Ok(())
        } else {
            Err(StorageError::NotFound(session_id.to_string()))
        }
    }

    async fn list_sectors(&self) -> Result<Vec<SectorDescriptor>, StorageError> {
        self.list_sector_descriptors().await.map_err(storage_fault)
    }
}
