//! Custom error types for the common library
//!
//! This module defines the error types shared by every flat-file store and
//! by the auxiliary SQLite archive.

use sqlx::Error as SqlxError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Custom error type for flat-file store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing a backing file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another process held the advisory lock for longer than the timeout
    #[error("Timed out after {timeout:?} waiting for lock on {path}")]
    LockTimeout { path: PathBuf, timeout: Duration },

    /// A JSON document could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A CSV document could not be written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StoreError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while creating the schema
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error raised while loading settings
#[derive(Error, Debug)]
#[error("Configuration error: {0}")]
pub struct SettingsError(#[from] pub config::ConfigError);
