//! In-memory store and recording sink for controller and lane tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    models::{GridPosition, Money, SectorAssignment, SectorDescriptor, Session, VehicleClass},
    presentation::{PresentationEvent, PresentationSink},
    store::{SessionStore, StorageError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Lookup(String),
    Open(VehicleClass, String),
    Finish(String, u64, Money),
    ListSectors,
}

pub fn open_session(id: &str, plate: &str, tariff: Money, duration_secs: u64) -> Session {
    Session {
        id: id.into(),
        plate_text: plate.into(),
        vehicle_class: VehicleClass::Car,
        tariff_per_hour: tariff,
        opened_at: Utc::now(),
        duration_secs,
        sector_name: Some("A".into()),
    }
}

#[derive(Default)]
pub struct FakeStore {
    calls: Mutex<Vec<StoreCall>>,
    open: Mutex<HashMap<String, Session>>,
    sectors: Mutex<HashMap<VehicleClass, String>>,
    failing: Mutex<HashSet<&'static str>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeStore {
    pub fn with_sector(class: VehicleClass, sector: &str) -> Self {
        let store = Self::default();
        store.sectors.lock().unwrap().insert(class, sector.into());
        store
    }

    pub fn insert_open(&self, session: Session) {
        self.open
            .lock()
            .unwrap()
            .insert(session.plate_text.clone(), session);
    }

    /// `operation` is one of `lookup`, `open`, `finish`.
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn open_plates(&self) -> Vec<String> {
        self.open.lock().unwrap().keys().cloned().collect()
    }

    async fn enter(&self, call: StoreCall, operation: &str) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(call);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(operation) {
            return Err(StorageError::Unavailable(format!("{operation} refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FakeStore {
    async fn lookup_open_session(&self, plate_text: &str) -> Result<Option<Session>, StorageError> {
        self.enter(StoreCall::Lookup(plate_text.into()), "lookup").await?;
        Ok(self.open.lock().unwrap().get(plate_text).cloned())
    }

    async fn open_session(
        &self,
        vehicle_class: VehicleClass,
        plate_text: &str,
    ) -> Result<Option<SectorAssignment>, StorageError> {
        self.enter(StoreCall::Open(vehicle_class, plate_text.into()), "open")
            .await?;
        let Some(sector) = self.sectors.lock().unwrap().get(&vehicle_class).cloned() else {
            return Ok(None);
        };
        let mut open = self.open.lock().unwrap();
        if open.contains_key(plate_text) {
            return Err(StorageError::Conflict(plate_text.into()));
        }
        let id = format!("stay-{}", open.len() + 1);
        open.insert(
            plate_text.into(),
            Session {
                id,
                plate_text: plate_text.into(),
                vehicle_class,
                tariff_per_hour: Money::from_cents(500),
                opened_at: Utc::now(),
                duration_secs: 0,
                sector_name: Some(sector.clone()),
            },
        );
        Ok(Some(SectorAssignment {
            sector_id: 1,
            sector_name: sector,
        }))
    }

    async fn finish_session(
        &self,
        session_id: &str,
        duration_secs: u64,
        amount_due: Money,
    ) -> Result<(), StorageError> {
        self.enter(
            StoreCall::Finish(session_id.into(), duration_secs, amount_due),
            "finish",
        )
        .await?;
        let mut open = self.open.lock().unwrap();
        let before = open.len();
        open.retain(|_, session| session.id != session_id);
        if open.len() == before {
            return Err(StorageError::NotFound(session_id.into()));
        }
        Ok(())
    }

    async fn list_sectors(&self) -> Result<Vec<SectorDescriptor>, StorageError> {
        self.enter(StoreCall::ListSectors, "list").await?;
        Ok(self
            .sectors
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(index, (class, name))| SectorDescriptor {
                id: index as i64 + 1,
                name: name.clone(),
                vehicle_class_name: class.as_str().into(),
                grid_position: GridPosition {
                    row: 0,
                    column: index as u32,
                },
            })
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PresentationEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<PresentationEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PresentationSink for RecordingSink {
    fn present(&self, event: PresentationEvent) {
        self.events.lock().unwrap().push(event);
    }
}
