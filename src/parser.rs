//! Row parser for yellow taxi trip files.

use chrono::NaiveDateTime;

use crate::error::{EtlError, EtlResult};

/// Primary timestamp layout used by current trip exports.
const LAYOUT_ISO: &str = "%Y-%m-%d %H:%M:%S";
/// Fallback layout seen in older exports (no seconds).
const LAYOUT_US: &str = "%m/%d/%Y %H:%M";

/// Positional columns within a trip row.
const PICKUP_FIELD: usize = 1;
const DROPOFF_FIELD: usize = 2;

/// One parsed trip: pickup and drop-off times plus the derived duration.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub pickup: NaiveDateTime,
    pub dropoff: NaiveDateTime,
    pub trip_time_minutes: f64,
}

impl TripRecord {
    /// Builds a record from already-parsed timestamps, deriving the duration
    /// as the whole-second difference converted to minutes.
    ///
    /// A drop-off earlier than the pickup yields a negative duration; such
    /// rows are kept as-is rather than rejected.
    pub fn from_times(pickup: NaiveDateTime, dropoff: NaiveDateTime) -> Self {
        let seconds = (dropoff - pickup).num_seconds();
        TripRecord {
            pickup,
            dropoff,
            trip_time_minutes: seconds as f64 / 60.0,
        }
    }
}

/// Parses a timestamp field, trying the primary layout first and falling
/// back to the US-style layout.
///
/// # Errors
///
/// Returns [`EtlError::Timestamp`] if the field matches neither layout.
pub fn parse_timestamp(field: &str) -> EtlResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(field, LAYOUT_ISO)
        .or_else(|_| NaiveDateTime::parse_from_str(field, LAYOUT_US))
        .map_err(|_| EtlError::Timestamp(field.to_string()))
}

/// Parses one delimited row into a [`TripRecord`].
///
/// Fields are positional: the second field is the pickup time, the third is
/// the drop-off time. All other fields in the row are ignored.
pub fn parse_row(row: &csv::StringRecord) -> EtlResult<TripRecord> {
    let pickup_field = row.get(PICKUP_FIELD).ok_or(EtlError::ShortRow(row.len()))?;
    let dropoff_field = row.get(DROPOFF_FIELD).ok_or(EtlError::ShortRow(row.len()))?;

    let pickup = parse_timestamp(pickup_field.trim())?;
    let dropoff = parse_timestamp(dropoff_field.trim())?;

    Ok(TripRecord::from_times(pickup, dropoff))
}
