use anyhow::Result;
use rusqlite::Row;

use crate::{
    db::{connection::Database, helpers::to_u32},
    models::{GridPosition, SectorDescriptor},
};

fn row_to_sector(row: &Row) -> Result<SectorDescriptor> {
    let grid_row: i64 = row.get("grid_row")?;
    let grid_column: i64 = row.get("grid_column")?;

    Ok(SectorDescriptor {
        id: row.get("id")?,
        name: row.get("name")?,
        vehicle_class_name: row.get("vehicle_type")?,
        grid_position: GridPosition {
            row: to_u32(grid_row, "grid_row")?,
            column: to_u32(grid_column, "grid_column")?,
        },
    })
}

impl Database {
    /// All sectors in map order (row, then column).
    pub async fn list_sector_descriptors(&self) -> Result<Vec<SectorDescriptor>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sec.id, sec.name, vt.name AS vehicle_type, sec.grid_row, sec.grid_column
                 FROM sectors sec
                 JOIN vehicle_types vt ON vt.id = sec.vehicle_type_id
                 ORDER BY sec.grid_row, sec.grid_column, sec.name",
            )?;

            let mut rows = stmt.query([])?;
            let mut sectors = Vec::new();
            while let Some(row) = rows.next()? {
                sectors.push(row_to_sector(row)?);
            }

            Ok(sectors)
        })
        .await
    }
}
