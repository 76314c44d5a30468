//! Pipeline orchestration: schema, extract, load, aggregate, summarize.
//!
//! Stage policy: persistence failures are isolated at the operation they
//! occur in (logged, stage result degraded) and never abort the run; parse
//! and filesystem failures propagate and abort it.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{error, info};

use crate::error::EtlResult;
use crate::extract::{self, Extraction};
use crate::output::RunSummary;
use crate::store::TripStore;

/// Runs one full ETL pass and returns the run summary.
///
/// `today` anchors the rolling window; the binary passes the current UTC
/// date, tests pass fixed dates.
#[tracing::instrument(skip(store), fields(input_dir = %input_dir.display()))]
pub fn run(
    store: &TripStore,
    input_dir: &Path,
    window_days: u32,
    today: NaiveDate,
) -> EtlResult<RunSummary> {
    if let Err(err) = store.ensure_schema() {
        error!(error = %err, "schema creation failed");
    }

    let extraction = extract::extract(input_dir, store)?;
    info!(
        files = extraction.new_files.len(),
        trips = extraction.trips.len(),
        "extraction complete"
    );

    load(store, &extraction);

    let average = match store.rolling_average_trip_time(window_days, today) {
        Ok(average) => average,
        Err(err) => {
            error!(error = %err, "rolling average query failed");
            None
        }
    };

    Ok(RunSummary {
        files_processed: extraction.new_files.len(),
        trips_loaded: extraction.trips.len(),
        window_days,
        average_trip_minutes: average.unwrap_or(0.0),
    })
}

/// Load stage: bulk-inserts the file markers and the trip records.
///
/// Insert failures are logged and the affected batch dropped; the run
/// continues either way.
fn load(store: &TripStore, extraction: &Extraction) {
    if let Err(err) = store.insert_processed_files(&extraction.new_files) {
        error!(error = %err, "failed to record processed files");
    }
    if let Err(err) = store.insert_trips(&extraction.trips) {
        error!(error = %err, "failed to insert trip records");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    const HEADER: &str = "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count\n";

    fn write_file(dir: &Path, name: &str, body: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_run_on_empty_directory_reports_zero() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        fs::create_dir(&data_dir).unwrap();

        let store = TripStore::new(dir.path().join("trips.db"));
        let summary = run(&store, &data_dir, 45, date("2020-02-15")).unwrap();

        assert_eq!(summary.files_processed, 0);
        assert_eq!(summary.trips_loaded, 0);
        assert_eq!(summary.average_trip_minutes, 0.0);
    }

    #[test]
    fn test_run_loads_and_averages_new_files() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        fs::create_dir(&data_dir).unwrap();
        write_file(
            &data_dir,
            "feb.csv",
            &format!(
                "{HEADER}\
                 1,2020-02-05 08:00:00,2020-02-05 08:05:00,2\n\
                 1,2020-02-05 09:00:00,2020-02-05 09:15:00,1\n"
            ),
        );

        let store = TripStore::new(dir.path().join("trips.db"));
        let summary = run(&store, &data_dir, 45, date("2020-02-15")).unwrap();

        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.trips_loaded, 2);
        assert_eq!(summary.average_trip_minutes, 10.0);
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        fs::create_dir(&data_dir).unwrap();
        write_file(
            &data_dir,
            "feb.csv",
            &format!("{HEADER}1,2020-02-05 08:00:00,2020-02-05 08:05:00,2\n"),
        );

        let store = TripStore::new(dir.path().join("trips.db"));
        run(&store, &data_dir, 45, date("2020-02-15")).unwrap();
        let second = run(&store, &data_dir, 45, date("2020-02-15")).unwrap();

        assert_eq!(second.files_processed, 0);
        assert_eq!(second.trips_loaded, 0);
        // The already-loaded trip still feeds the average
        assert_eq!(second.average_trip_minutes, 5.0);
        assert_eq!(store.processed_files().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_failure_aborts_before_any_load() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        fs::create_dir(&data_dir).unwrap();
        write_file(
            &data_dir,
            "bad.csv",
            &format!(
                "{HEADER}\
                 1,2020-02-05 08:00:00,2020-02-05 08:05:00,2\n\
                 1,not-a-date,2020-02-05 09:00:00,1\n"
            ),
        );

        let store = TripStore::new(dir.path().join("trips.db"));
        let result = run(&store, &data_dir, 45, date("2020-02-15"));
        assert!(matches!(result, Err(EtlError::Timestamp(_))));

        // Nothing from the failed file reached the store, including the
        // row that parsed cleanly before the bad one.
        assert!(store.processed_files().unwrap().is_empty());
        assert_eq!(
            store
                .rolling_average_trip_time(45, date("2020-02-15"))
                .unwrap(),
            None
        );
    }
}
