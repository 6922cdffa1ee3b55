//! SQLite mirror of the run log and the incident reports attached to it

use auth::Assignment;
use serde::Serialize;
use sqlx::{FromRow, Row, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{RunError, RunResult};
use crate::models::{RunRecord, UnitStatus, split_assigned};

/// Run row of the archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ArchivedRun {
    pub id: i64,
    pub run_number: String,
    pub caller: String,
    pub location: String,
    pub nature: String,
    pub assigned: String,
    pub notes: String,
    pub timestamp: String,
    pub locked: bool,
    /// Distinct units in the status history, in first-seen order
    #[sqlx(skip)]
    #[serde(skip)]
    pub status_units: Vec<String>,
}

impl Assignment for ArchivedRun {
    fn assigned_units(&self) -> Vec<String> {
        split_assigned(&self.assigned)
    }

    fn assigned_responders(&self) -> Vec<String> {
        self.status_units.clone()
    }
}

/// Archive repository
#[derive(Clone)]
pub struct RunArchive {
    pool: SqlitePool,
}

impl RunArchive {
    /// Create a new archive over a pool whose schema is already set up
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Mirror runs that are not archived yet, matched by run number
    ///
    /// Already archived runs get any addendums they are missing. Returns the
    /// number of runs added.
    pub async fn sync(&self, runs: &[RunRecord]) -> RunResult<usize> {
        let mut tx = self.pool.begin().await?;
        let mut added = 0;

        for run in runs {
            let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM runs WHERE run_number = ?")
                .bind(&run.run_number)
                .fetch_optional(&mut *tx)
                .await?;

            let run_id = match existing {
                Some(id) => id,
                None => {
                    let id: i64 = sqlx::query_scalar(
                        r#"
                        INSERT INTO runs (run_number, caller, location, nature, assigned, notes, timestamp)
                        VALUES (?, ?, ?, ?, ?, ?, ?)
                        RETURNING id
                        "#,
                    )
                    .bind(&run.run_number)
                    .bind(&run.caller)
                    .bind(&run.location)
                    .bind(&run.nature)
                    .bind(&run.assigned)
                    .bind(&run.notes)
                    .bind(&run.timestamp)
                    .fetch_one(&mut *tx)
                    .await?;

                    for status in &run.statuses {
                        sqlx::query("INSERT INTO statuses (run_id, unit, status, timestamp) VALUES (?, ?, ?, ?)")
                            .bind(id)
                            .bind(&status.unit)
                            .bind(&status.status)
                            .bind(&status.timestamp)
                            .execute(&mut *tx)
                            .await?;
                    }

                    added += 1;
                    debug!("Archived run {} as id {}", run.run_number, id);
                    id
                }
            };

            // addendums are append-only, so the archived rows are a prefix
            let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM addendums WHERE run_id = ?")
                .bind(run_id)
                .fetch_one(&mut *tx)
                .await?;
            for entry in run.addendums.iter().skip(usize::try_from(known).unwrap_or(0)) {
                sqlx::query("INSERT INTO addendums (run_id, entry) VALUES (?, ?)")
                    .bind(run_id)
                    .bind(entry)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        info!("Archive sync added {} run(s)", added);
        Ok(added)
    }

    /// Archived runs, newest first
    pub async fn list(&self) -> RunResult<Vec<ArchivedRun>> {
        let mut runs = sqlx::query_as::<_, ArchivedRun>(
            r#"
            SELECT id, run_number, caller, location, nature, assigned, notes, timestamp, locked
            FROM runs
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let rows = sqlx::query("SELECT run_id, unit FROM statuses ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        let mut units: HashMap<i64, Vec<String>> = HashMap::new();
        for row in rows {
            push_unit(units.entry(row.get("run_id")).or_default(), row.get("unit"));
        }
        for run in &mut runs {
            run.status_units = units.remove(&run.id).unwrap_or_default();
        }
        Ok(runs)
    }

    pub async fn find_by_number(&self, run_number: &str) -> RunResult<Option<ArchivedRun>> {
        let run = sqlx::query_as::<_, ArchivedRun>(
            r#"
            SELECT id, run_number, caller, location, nature, assigned, notes, timestamp, locked
            FROM runs
            WHERE run_number = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(run_number.trim())
        .fetch_optional(&self.pool)
        .await?;

        match run {
            Some(run) => Ok(Some(self.with_status_units(run).await?)),
            None => Ok(None),
        }
    }

    pub async fn find(&self, run_id: i64) -> RunResult<ArchivedRun> {
        let run = sqlx::query_as::<_, ArchivedRun>(
            r#"
            SELECT id, run_number, caller, location, nature, assigned, notes, timestamp, locked
            FROM runs
            WHERE id = ?
            "#,
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RunError::ArchivedRunNotFound(run_id))?;
        self.with_status_units(run).await
    }

    async fn with_status_units(&self, mut run: ArchivedRun) -> RunResult<ArchivedRun> {
        let units: Vec<String> = sqlx::query_scalar("SELECT unit FROM statuses WHERE run_id = ? ORDER BY rowid")
            .bind(run.id)
            .fetch_all(&self.pool)
            .await?;
        for unit in units {
            push_unit(&mut run.status_units, unit);
        }
        Ok(run)
    }

    /// Status history of an archived run, in insertion order
    pub async fn statuses(&self, run_id: i64) -> RunResult<Vec<UnitStatus>> {
        let rows = sqlx::query("SELECT unit, status, timestamp FROM statuses WHERE run_id = ? ORDER BY rowid")
            .bind(run_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| UnitStatus {
                unit: row.get("unit"),
                status: row.get("status"),
                timestamp: row.get("timestamp"),
            })
            .collect())
    }

    pub async fn addendums(&self, run_id: i64) -> RunResult<Vec<String>> {
        let entries = sqlx::query_scalar("SELECT entry FROM addendums WHERE run_id = ? ORDER BY rowid")
            .bind(run_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    /// Attach an incident report to an archived run; reports are write-once
    pub async fn save_incident_report(&self, run_id: i64, notes: &str) -> RunResult<()> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(RunError::InvalidInput("incident report is empty".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let run_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM runs WHERE id = ?")
            .bind(run_id)
            .fetch_optional(&mut *tx)
            .await?;
        if run_exists.is_none() {
            return Err(RunError::ArchivedRunNotFound(run_id));
        }

        let report_exists: Option<i64> = sqlx::query_scalar("SELECT run_id FROM incidents WHERE run_id = ?")
            .bind(run_id)
            .fetch_optional(&mut *tx)
            .await?;
        if report_exists.is_some() {
            return Err(RunError::IncidentExists(run_id));
        }

        sqlx::query("INSERT INTO incidents (run_id, incident_notes) VALUES (?, ?)")
            .bind(run_id)
            .bind(notes)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE runs SET locked = 1 WHERE id = ?")
            .bind(run_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Saved incident report for archived run {}", run_id);
        Ok(())
    }

    pub async fn incident_report(&self, run_id: i64) -> RunResult<Option<String>> {
        let notes = sqlx::query_scalar("SELECT incident_notes FROM incidents WHERE run_id = ?")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(notes)
    }
}

fn push_unit(units: &mut Vec<String>, unit: String) {
    let unit = unit.trim();
    if !unit.is_empty() && !units.iter().any(|known| known == unit) {
        units.push(unit.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{DatabaseConfig, init_pool, setup_schema};

    async fn archive() -> RunArchive {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        setup_schema(&pool).await.unwrap();
        RunArchive::new(pool)
    }

    fn run(number: &str, timestamp: &str) -> RunRecord {
        RunRecord {
            run_number: number.to_string(),
            caller: "Gate".to_string(),
            nature: "Fall".to_string(),
            assigned: "41".to_string(),
            timestamp: timestamp.to_string(),
            statuses: vec![UnitStatus::new("41", "ON SCENE", timestamp)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sync_adds_only_new_runs() {
        let archive = archive().await;
        let first = run("1", "2025-03-01 08:00:00");
        let mut second = run("2", "2025-03-02 08:00:00");

        assert_eq!(archive.sync(&[first.clone()]).await.unwrap(), 1);
        assert_eq!(archive.sync(&[first.clone(), second.clone()]).await.unwrap(), 1);

        second.addendums.push("[t] alex: follow-up".to_string());
        assert_eq!(archive.sync(&[first, second]).await.unwrap(), 0);

        let listed = archive.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].run_number, "2");

        let addendums = archive.addendums(listed[0].id).await.unwrap();
        assert_eq!(addendums, vec!["[t] alex: follow-up"]);
        let statuses = archive.statuses(listed[1].id).await.unwrap();
        assert_eq!(statuses[0].unit, "41");
    }

    #[tokio::test]
    async fn test_incident_report_is_write_once() {
        let archive = archive().await;
        archive.sync(&[run("7", "2025-03-01 08:00:00")]).await.unwrap();
        let id = archive.find_by_number("7").await.unwrap().unwrap().id;

        assert_eq!(archive.incident_report(id).await.unwrap(), None);
        archive.save_incident_report(id, "Patient refused care").await.unwrap();

        let err = archive.save_incident_report(id, "second").await.unwrap_err();
        assert!(matches!(err, RunError::IncidentExists(run_id) if run_id == id));
        assert_eq!(
            archive.incident_report(id).await.unwrap().as_deref(),
            Some("Patient refused care")
        );
        assert!(archive.find_by_number("7").await.unwrap().unwrap().locked);
    }

    #[tokio::test]
    async fn test_incident_report_requires_archived_run() {
        let archive = archive().await;
        let err = archive.save_incident_report(42, "notes").await.unwrap_err();
        assert!(matches!(err, RunError::ArchivedRunNotFound(42)));
        assert!(matches!(archive.find(42).await, Err(RunError::ArchivedRunNotFound(42))));
    }

    #[tokio::test]
    async fn test_status_history_grants_visibility_after_sync() {
        use auth::{AccessPolicy, ResponderLinks};

        let archive = archive().await;
        let mut logged = run("12", "2025-03-03 08:00:00");
        logged.assigned = String::new();
        logged.statuses = vec![UnitStatus::new("41", "ENROUTE", "2025-03-03 08:01:00")];

        let policy = AccessPolicy::new("Dakota", ResponderLinks::from_pairs([("41", vec!["chris"])]));
        assert!(policy.can_view("chris", &logged));

        archive.sync(&[logged]).await.unwrap();
        let listed = archive.list().await.unwrap();
        assert_eq!(listed[0].status_units, vec!["41"]);
        assert!(policy.can_view("chris", &listed[0]));
        assert!(!policy.can_view("kelsey", &listed[0]));

        let found = archive.find(listed[0].id).await.unwrap();
        assert!(policy.can_view("chris", &found));
        let by_number = archive.find_by_number("12").await.unwrap().unwrap();
        assert!(policy.can_view("chris", &by_number));
    }

    #[tokio::test]
    async fn test_repeated_addendums_are_all_archived() {
        let archive = archive().await;
        let mut logged = run("13", "2025-03-04 08:00:00");
        logged.addendums = vec!["[t] alex: recheck".to_string(), "[t] alex: recheck".to_string()];
        archive.sync(&[logged.clone()]).await.unwrap();

        logged.addendums.push("[t] alex: recheck".to_string());
        archive.sync(&[logged]).await.unwrap();

        let id = archive.find_by_number("13").await.unwrap().unwrap().id;
        assert_eq!(archive.addendums(id).await.unwrap().len(), 3);
    }
}
