//! Common library for the dispatch log workspace
//!
//! This crate provides shared functionality used by the auth, runs and shift
//! crates: error types, advisory file locking, file helpers, settings and
//! the SQLite archive connection.

pub mod database;
pub mod error;
pub mod fs;
pub mod lock;
pub mod settings;

pub use error::{DatabaseError, DatabaseResult, SettingsError, StoreError, StoreResult};
pub use lock::FileLock;
pub use settings::Settings;
