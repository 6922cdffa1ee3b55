//! Run log for the dispatch console
//!
//! Runs are kept as text blocks in a shared log file guarded by an advisory
//! lock, mirrored on demand into a SQLite archive that also stores incident
//! reports.

pub mod archive;
pub mod codec;
pub mod error;
pub mod export;
pub mod models;
pub mod search;
pub mod store;

pub use archive::{ArchivedRun, RunArchive};
pub use error::{RunError, RunResult};
pub use models::{NewRun, RunRecord, UnitStatus};
pub use store::RunLogStore;
