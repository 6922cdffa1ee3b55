//! Error types for shift logs and the responder roster

use common::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShiftError {
    /// Not one of the four crews
    #[error("Unknown shift '{0}', expected A, B, C or D")]
    InvalidShift(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// End of shift requested with no log for today
    #[error("No current log for {0} to archive")]
    NothingToArchive(String),

    #[error("Shift summary '{0}' not found")]
    SummaryNotFound(String),

    #[error("Unit code '{code}' already exists in {shift}")]
    DuplicateResponder { code: String, shift: String },

    #[error("Unit code '{code}' not found in {shift}")]
    ResponderNotFound { code: String, shift: String },

    /// Backing file error
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ShiftResult<T> = Result<T, ShiftError>;
