/// SQLite-backed tee-time store
use super::{StoreError, TeeTimeFilter, TeeTimeStore};
use crate::normalize::time_sort_key;
use crate::types::TeeTimeRecord;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_tee_times.sql");

/// Times that don't parse sort after every real time of day.
const UNSORTABLE_TIME: u32 = 24 * 60;

pub struct SqliteTeeTimeStore {
    db: Mutex<Connection>,
}

impl SqliteTeeTimeStore {
    /// Opens (or creates) the database at `path` and initializes the schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.db.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Distinct course ids that have at least one stored record
    pub fn courses(&self) -> Result<Vec<String>, StoreError> {
        let db = self.lock()?;
        let mut stmt = db.prepare("SELECT DISTINCT course_id FROM tee_times ORDER BY course_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

impl TeeTimeStore for SqliteTeeTimeStore {
    fn replace_day(
        &self,
        course_id: &str,
        iso_date: NaiveDate,
        records: &[TeeTimeRecord],
    ) -> Result<usize, StoreError> {
        let mut db = self.lock()?;
        let tx = db.transaction()?;

        let removed = tx.execute(
            "DELETE FROM tee_times WHERE course_id = ?1 AND iso_date = ?2",
            params![course_id, iso_date],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO tee_times (
                    course_id, iso_date, display_date, time, time_minutes,
                    min_players, max_players, price, date_derived, harvested_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            // Records always land under the key being replaced
            for record in records {
                insert.execute(params![
                    course_id,
                    iso_date,
                    record.display_date,
                    record.time,
                    time_sort_key(&record.time).unwrap_or(UNSORTABLE_TIME),
                    record.min_players,
                    record.max_players,
                    record.price,
                    record.date_derived,
                    record.harvested_at,
                ])?;
            }
        }

        tx.commit()?;
        debug!(course_id, %iso_date, removed, written = records.len(), "Replaced day");
        Ok(records.len())
    }

    fn query(&self, filter: &TeeTimeFilter) -> Result<Vec<TeeTimeRecord>, StoreError> {
        let db = self.lock()?;
        let mut stmt = db.prepare(
            "SELECT course_id, iso_date, display_date, time, min_players, max_players,
                    price, date_derived, harvested_at
             FROM tee_times
             WHERE (?1 IS NULL OR course_id = ?1)
               AND (?2 IS NULL OR iso_date >= ?2)
               AND (?3 IS NULL OR iso_date <= ?3)
             ORDER BY iso_date, time_minutes, time, course_id",
        )?;

        let records = stmt
            .query_map(params![filter.course_id, filter.from, filter.to], |row| {
                Ok(TeeTimeRecord {
                    course_id: row.get(0)?,
                    iso_date: row.get(1)?,
                    display_date: row.get(2)?,
                    time: row.get(3)?,
                    min_players: row.get(4)?,
                    max_players: row.get(5)?,
                    price: row.get(6)?,
                    date_derived: row.get(7)?,
                    harvested_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
