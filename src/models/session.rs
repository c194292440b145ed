use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Money, VehicleClass};

/// An open parking stay as returned by the store when its plate is seen again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub plate_text: String,
    pub vehicle_class: VehicleClass,
    pub tariff_per_hour: Money,
    pub opened_at: DateTime<Utc>,
    /// Elapsed time between `opened_at` and the lookup.
    pub duration_secs: u64,
    pub sector_name: Option<String>,
}

/// Sector reserved by a successful open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SectorAssignment {
    pub sector_id: i64,
    pub sector_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GridPosition {
    pub row: u32,
    pub column: u32,
}

/// Read-only sector description for the map view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SectorDescriptor {
    pub id: i64,
    pub name: String,
    pub vehicle_class_name: String,
    pub grid_position: GridPosition,
}
