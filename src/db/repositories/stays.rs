use anyhow::Result;
use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use crate::{
    db::{
        connection::Database,
        helpers::{elapsed_secs, parse_datetime, to_i64},
    },
    models::{Money, SectorAssignment, Session, VehicleClass},
};

/// Result of trying to open a stay for a plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Assigned(SectorAssignment),
    NoCapacity,
    /// The plate already has an open stay; nothing was written.
    AlreadyOpen,
}

fn row_to_session(row: &Row, now: DateTime<Utc>) -> Result<Session> {
    let vehicle_type: String = row.get("vehicle_type")?;
    let started_at: String = row.get("started_at")?;
    let started_at = parse_datetime(&started_at, "started_at")?;

    Ok(Session {
        id: row.get("id")?,
        plate_text: row.get("license_plate")?,
        vehicle_class: VehicleClass::parse(&vehicle_type)?,
        tariff_per_hour: Money::from_cents(row.get("tariff_cents")?),
        opened_at: started_at,
        duration_secs: elapsed_secs(started_at, now),
        sector_name: row.get("sector_name")?,
    })
}

impl Database {
    pub async fn lookup_open_stay(
        &self,
        plate_text: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        let plate_text = plate_text.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT st.id, st.license_plate, vt.name AS vehicle_type, st.tariff_cents,
                        st.started_at, sec.name AS sector_name
                 FROM stays st
                 JOIN vehicle_types vt ON vt.id = st.vehicle_type_id
                 LEFT JOIN sectors sec ON sec.id = st.sector_id
                 WHERE st.license_plate = ?1 AND st.ended_at IS NULL",
            )?;

            let mut rows = stmt.query(params![plate_text])?;
            let session = match rows.next()? {
                Some(row) => Some(row_to_session(row, now)?),
                None => None,
            };
            Ok(session)
        })
        .await
    }

    /// Reserves a sector and records the stay in one immediate transaction.
    pub async fn open_stay(
        &self,
        vehicle_class: VehicleClass,
        plate_text: &str,
        now: DateTime<Utc>,
    ) -> Result<OpenOutcome> {
        let plate_text = plate_text.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM stays WHERE license_plate = ?1 AND ended_at IS NULL",
                    params![plate_text],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(OpenOutcome::AlreadyOpen);
            }

            let vehicle_type: Option<(i64, i64)> = tx
                .query_row(
                    "SELECT id, tariff_cents FROM vehicle_types WHERE name = ?1",
                    params![vehicle_class.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((vehicle_type_id, tariff_cents)) = vehicle_type else {
                warn!("No vehicle type configured for {}", vehicle_class.as_str());
                return Ok(OpenOutcome::NoCapacity);
            };

            let sector: Option<(i64, String)> = tx
                .query_row(
                    "SELECT sec.id, sec.name
                     FROM sectors sec
                     LEFT JOIN stays st ON st.sector_id = sec.id AND st.ended_at IS NULL
                     WHERE sec.vehicle_type_id = ?1
                     GROUP BY sec.id
                     HAVING COUNT(st.id) < sec.capacity
                     ORDER BY COUNT(st.id), sec.name
                     LIMIT 1",
                    params![vehicle_type_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((sector_id, sector_name)) = sector else {
                return Ok(OpenOutcome::NoCapacity);
            };

            tx.execute(
                "INSERT INTO stays (id, license_plate, vehicle_type_id, sector_id, tariff_cents, started_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    plate_text,
                    vehicle_type_id,
                    sector_id,
                    tariff_cents,
                    now.to_rfc3339(),
                ],
            )?;
            tx.commit()?;

            Ok(OpenOutcome::Assigned(SectorAssignment {
                sector_id,
                sector_name,
            }))
        })
        .await
    }

    /// Closes a still-open stay. Returns `false` when no open stay has that id.
    pub async fn finish_stay(
        &self,
        stay_id: &str,
        duration_secs: u64,
        payment: Money,
        ended_at: DateTime<Utc>,
    ) -> Result<bool> {
        let stay_id = stay_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE stays
                 SET ended_at = ?1,
                     duration_secs = ?2,
                     payment_cents = ?3
                 WHERE id = ?4 AND ended_at IS NULL",
                params![
                    ended_at.to_rfc3339(),
                    to_i64(duration_secs)?,
                    payment.cents(),
                    stay_id,
                ],
            )?;
            Ok(rows_affected == 1)
        })
        .await
    }

    pub async fn count_open_stays(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM stays WHERE ended_at IS NULL", [], |row| {
                    row.get(0)
                })?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}
