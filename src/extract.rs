//! Extraction stage: walks the input directory and parses new trip files.

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{info, warn};

use crate::error::EtlResult;
use crate::parser::{self, TripRecord};
use crate::reconcile;
use crate::store::TripStore;

/// Everything produced by one extraction pass.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Files read during this pass, to be marked processed by the loader.
    pub new_files: Vec<String>,
    /// Trip records accumulated across all new files.
    pub trips: Vec<TripRecord>,
}

/// Lists plain files in the input directory. Sub-directories are ignored.
pub fn list_input_files(dir: &Path) -> EtlResult<HashSet<String>> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Reads one trip file, skipping the header row.
///
/// Any row that fails to parse aborts the whole file; there is no per-row
/// recovery.
pub fn read_trip_file(path: &Path) -> EtlResult<Vec<TripRecord>> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut trips = Vec::new();
    for row in reader.records() {
        trips.push(parser::parse_row(&row?)?);
    }
    Ok(trips)
}

/// Runs the extraction stage: diffs the input directory against the
/// processed-file set and parses every file not seen before.
///
/// A query failure against the processed-file table degrades to the empty
/// set (a fresh or unreachable database never blocks extraction); parse and
/// filesystem failures propagate and abort the run. Files already marked
/// processed are skipped entirely, never re-read.
pub fn extract(input_dir: &Path, store: &TripStore) -> EtlResult<Extraction> {
    let on_disk = list_input_files(input_dir)?;
    let processed = match store.processed_files() {
        Ok(names) => names,
        Err(err) => {
            warn!(error = %err, "could not read processed files, assuming none");
            HashSet::new()
        }
    };

    let pending = reconcile::unprocessed(&on_disk, &processed);

    let mut extraction = Extraction::default();
    for name in pending {
        let path = input_dir.join(&name);
        let records = read_trip_file(&path)?;
        info!(file = %name, rows = records.len(), "file extracted");

        extraction.trips.extend(records);
        extraction.new_files.push(name);
    }

    Ok(extraction)
}
