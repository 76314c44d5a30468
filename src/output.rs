//! Report formatting for a completed pipeline run.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

/// Outcome of one pipeline run.
///
/// Logged as structured JSON and rendered as the single report line the
/// tool prints on stdout.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub files_processed: usize,
    pub trips_loaded: usize,
    pub window_days: u32,
    pub average_trip_minutes: f64,
}

impl RunSummary {
    /// The human-readable report line, e.g.
    /// `45 days rolling average trip time is 12.34 minutes.`
    pub fn report_line(&self) -> String {
        format!(
            "{} days rolling average trip time is {:.2} minutes.",
            self.window_days, self.average_trip_minutes
        )
    }
}

/// Logs the run summary as a single JSON object.
pub fn log_summary(summary: &RunSummary) -> Result<()> {
    info!("{}", serde_json::to_string(summary)?);
    Ok(())
}
