//! SQLite persistence for processed-file markers and trip records.
//!
//! Schema (compatibility contract with existing databases):
//!
//! ```sql
//! FilesProcessed(ID INTEGER PRIMARY KEY AUTOINCREMENT, FileName TEXT NOT NULL)
//! YellowTaxiTrip(ID INTEGER PRIMARY KEY AUTOINCREMENT,
//!                PickupDateTime TEXT NOT NULL,
//!                DropDateTime TEXT NOT NULL,
//!                TripTimeMinutes INTEGER NOT NULL)
//! ```
//!
//! `TripTimeMinutes` keeps its historical `INTEGER` declaration; SQLite's
//! type affinity stores the fractional minutes as REAL without truncation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::error::EtlResult;
use crate::parser::TripRecord;

/// Layout used for the TEXT datetime columns.
const COLUMN_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Handle to the trip database.
///
/// Holds only the path: every operation opens its own connection and drops
/// it when done, so no connection is held across pipeline stages.
pub struct TripStore {
    path: PathBuf,
}

impl TripStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TripStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> EtlResult<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Creates both tables if they do not already exist.
    pub fn ensure_schema(&self) -> EtlResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS FilesProcessed
             (
                 ID INTEGER PRIMARY KEY AUTOINCREMENT,
                 FileName TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS YellowTaxiTrip
             (
                 ID INTEGER PRIMARY KEY AUTOINCREMENT,
                 PickupDateTime TEXT NOT NULL,
                 DropDateTime TEXT NOT NULL,
                 TripTimeMinutes INTEGER NOT NULL
             );",
        )?;
        Ok(())
    }

    /// File names already recorded as processed.
    ///
    /// An empty table is an empty set, not an error.
    pub fn processed_files(&self) -> EtlResult<HashSet<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT FileName FROM FilesProcessed")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = HashSet::new();
        for name in rows {
            names.insert(name?);
        }
        Ok(names)
    }

    /// Bulk-inserts processed-file markers inside a single transaction.
    pub fn insert_processed_files(&self, names: &[String]) -> EtlResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO FilesProcessed (FileName) VALUES (?1)")?;
            for name in names {
                stmt.execute(params![name])?;
            }
        }
        tx.commit()?;

        debug!(count = names.len(), "processed-file markers inserted");
        Ok(())
    }

    /// Bulk-inserts trip records inside a single transaction.
    pub fn insert_trips(&self, trips: &[TripRecord]) -> EtlResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO YellowTaxiTrip (PickupDateTime, DropDateTime, TripTimeMinutes)
                 VALUES (?1, ?2, ?3)",
            )?;
            for trip in trips {
                stmt.execute(params![
                    trip.pickup.format(COLUMN_LAYOUT).to_string(),
                    trip.dropoff.format(COLUMN_LAYOUT).to_string(),
                    trip.trip_time_minutes,
                ])?;
            }
        }
        tx.commit()?;

        debug!(count = trips.len(), "trip records inserted");
        Ok(())
    }

    /// Mean trip duration over the trailing `days`-day window ending `today`.
    ///
    /// Both bounds are rendered as calendar dates and compared against the
    /// stored TEXT timestamps, so the window opens at midnight `days` days
    /// ago and closes at midnight today. Returns `None` when no rows fall
    /// inside the window.
    pub fn rolling_average_trip_time(
        &self,
        days: u32,
        today: NaiveDate,
    ) -> EtlResult<Option<f64>> {
        let lower = today
            .checked_sub_days(Days::new(days as u64))
            .unwrap_or(NaiveDate::MIN)
            .format("%Y-%m-%d")
            .to_string();
        let upper = today.format("%Y-%m-%d").to_string();

        let conn = self.connect()?;
        let average = conn.query_row(
            "SELECT avg(TripTimeMinutes) FROM YellowTaxiTrip
             WHERE DropDateTime >= ?1 AND DropDateTime <= ?2",
            params![lower, upper],
            |row| row.get::<_, Option<f64>>(0),
        )?;

        Ok(average)
    }
}
