//! File-set reconciliation between the input directory and the store.

use std::collections::HashSet;

/// Returns the file names present on disk but not yet recorded as processed.
///
/// Pure set difference; the ordering of the result is unspecified. An empty
/// processed set (nothing ingested yet) simply returns everything on disk.
pub fn unprocessed(on_disk: &HashSet<String>, processed: &HashSet<String>) -> Vec<String> {
    on_disk.difference(processed).cloned().collect()
}
