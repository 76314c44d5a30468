use thiserror::Error;

/// Failure classes for the trip ETL pipeline.
///
/// Parse failures (`Timestamp`, `ShortRow`) and input failures (`Csv`, `Io`)
/// abort the run; `Database` failures are handled at the operation boundary
/// and the run continues with a degraded result.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("unrecognized timestamp format: '{0}'")]
    Timestamp(String),

    #[error("row has {0} fields, expected at least 3")]
    ShortRow(usize),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EtlResult<T> = Result<T, EtlError>;
