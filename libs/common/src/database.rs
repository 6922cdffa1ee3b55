//! Database module for the auxiliary SQLite archive
//!
//! This module provides connection pooling, configuration, health checks and
//! schema setup for the SQLite database that mirrors the run log and holds
//! incident reports.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use tracing::info;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS runs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_number TEXT NOT NULL,
        caller TEXT NOT NULL DEFAULT '',
        location TEXT NOT NULL DEFAULT '',
        nature TEXT NOT NULL DEFAULT '',
        assigned TEXT NOT NULL DEFAULT '',
        notes TEXT NOT NULL DEFAULT '',
        timestamp TEXT NOT NULL DEFAULT '',
        locked INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS statuses (
        run_id INTEGER NOT NULL,
        unit TEXT NOT NULL,
        status TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        FOREIGN KEY(run_id) REFERENCES runs(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS addendums (
        run_id INTEGER NOT NULL,
        entry TEXT NOT NULL,
        FOREIGN KEY(run_id) REFERENCES runs(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS incidents (
        run_id INTEGER PRIMARY KEY,
        incident_notes TEXT NOT NULL,
        FOREIGN KEY(run_id) REFERENCES runs(id)
    )
    "#,
];

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `DISPATCH_DATABASE_URL`: SQLite URL (default: "sqlite://ppm.db?mode=rwc")
    /// - `DISPATCH_DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
    pub fn from_env() -> DatabaseResult<Self> {
        let database_url = env::var("DISPATCH_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://ppm.db?mode=rwc".to_string());

        let max_connections = env::var("DISPATCH_DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            max_connections,
        })
    }

    /// Private in-memory database, mostly for tests
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// Initialize a SQLite connection pool
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<SqlitePool>` - SQLite connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let options = config
        .database_url
        .parse::<SqliteConnectOptions>()
        .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(DatabaseError::Connection)?;

    info!("SQLite pool initialized for {}", config.database_url);
    Ok(pool)
}

/// Check database connectivity
pub async fn health_check(pool: &SqlitePool) -> DatabaseResult<bool> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(true)
}

/// Create the archive tables if they do not exist yet
pub async fn setup_schema(pool: &SqlitePool) -> DatabaseResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    }
    Ok(())
}
