//! Error types for the run log

use common::{DatabaseError, StoreError};
use thiserror::Error;

/// Custom error type for run log and archive operations
#[derive(Error, Debug)]
pub enum RunError {
    /// A field would corrupt the block format
    #[error("Invalid run data: {0}")]
    InvalidInput(String),

    /// No block with this run number in the log
    #[error("Run not found: {0}")]
    RunNotFound(String),

    /// No archived run with this database id
    #[error("Archived run {0} not found")]
    ArchivedRunNotFound(i64),

    /// Incident reports are written once
    #[error("An incident report already exists for archived run {0}")]
    IncidentExists(i64),

    /// Backing file error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// SQLite archive error
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for RunError {
    fn from(e: sqlx::Error) -> Self {
        RunError::Database(DatabaseError::Query(e))
    }
}

/// Type alias for run results
pub type RunResult<T> = Result<T, RunError>;
