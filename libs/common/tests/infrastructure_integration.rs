//! Integration tests for the infrastructure components
//!
//! These tests verify that the advisory file lock keeps concurrent writers
//! apart and that the SQLite archive is reachable once its schema exists.

use common::{
    FileLock,
    database::{DatabaseConfig, health_check, init_pool, setup_schema},
    fs::{append, read_optional},
    lock::DEFAULT_LOCK_TIMEOUT,
};
use sqlx::Row;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Writers that each append a multi-line record under the lock never
/// interleave their lines
#[test]
fn test_locked_appends_do_not_interleave() {
    let dir = TempDir::new().unwrap();
    let path = Arc::new(dir.path().join("shared.txt"));

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let path = Arc::clone(&path);
            thread::spawn(move || {
                for n in 0..20 {
                    let _lock = FileLock::acquire(&path, DEFAULT_LOCK_TIMEOUT).unwrap();
                    append(&path, &format!("BEGIN {writer}-{n}\n")).unwrap();
                    thread::yield_now();
                    append(&path, &format!("END {writer}-{n}\n")).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let contents = read_optional(&path).unwrap().unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4 * 20 * 2);
    for pair in lines.chunks(2) {
        let begin = pair[0].strip_prefix("BEGIN ").unwrap();
        let end = pair[1].strip_prefix("END ").unwrap();
        assert_eq!(begin, end, "record split by another writer");
    }
}

#[tokio::test]
async fn test_archive_database_integration() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;
    setup_schema(&pool).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    sqlx::query("INSERT INTO runs (run_number, caller) VALUES (?, ?)")
        .bind("R-1")
        .bind("Front gate")
        .execute(&pool)
        .await?;

    let row = sqlx::query("SELECT COUNT(*) AS total FROM runs")
        .fetch_one(&pool)
        .await?;
    let total: i64 = row.get("total");
    assert_eq!(total, 1, "SQLite insert test failed");

    Ok(())
}
