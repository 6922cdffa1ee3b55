//! Run log store over the shared text file

use chrono::Local;
use common::{FileLock, StoreResult, fs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::codec;
use crate::error::{RunError, RunResult};
use crate::models::{NewRun, RunRecord};

/// Timestamp layout used for runs, statuses and addendums
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in [`TIMESTAMP_FORMAT`]
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Append-mostly store of run blocks
#[derive(Debug, Clone)]
pub struct RunLogStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl RunLogStore {
    pub fn new(path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            lock_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a new run block under the file lock
    pub fn append_run(&self, new_run: NewRun) -> RunResult<RunRecord> {
        let record = RunRecord {
            run_number: new_run.run_number.trim().to_string(),
            caller: new_run.caller.trim().to_string(),
            location: new_run.location.trim().to_string(),
            nature: new_run.nature.trim().to_string(),
            assigned: new_run.assigned.trim().to_string(),
            timestamp: new_run
                .timestamp
                .map(|ts| ts.trim().to_string())
                .filter(|ts| !ts.is_empty())
                .unwrap_or_else(now_timestamp),
            notes: new_run.notes.trim_end().to_string(),
            statuses: new_run.statuses,
            addendums: Vec::new(),
        };
        codec::validate(&record)?;

        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        if self.read()?.is_some_and(|contents| {
            codec::parse(&contents)
                .iter()
                .any(|run| run.run_number == record.run_number)
        }) {
            warn!("Run number {} already logged; appending anyway", record.run_number);
        }
        fs::append(&self.path, &codec::encode(&record))?;

        info!("Logged run {}", record.run_number);
        Ok(record)
    }

    /// Every complete run in file order; a missing log is empty
    ///
    /// Reads without the lock; a block still being written is ignored.
    pub fn list_runs(&self) -> RunResult<Vec<RunRecord>> {
        Ok(self.read()?.map(|contents| codec::parse(&contents)).unwrap_or_default())
    }

    /// First run with this run number
    pub fn find_run(&self, run_number: &str) -> RunResult<RunRecord> {
        let run_number = run_number.trim();
        self.list_runs()?
            .into_iter()
            .find(|run| run.run_number == run_number)
            .ok_or_else(|| RunError::RunNotFound(run_number.to_string()))
    }

    /// Append `[timestamp] author: text` to the first matching run
    ///
    /// The whole read-modify-write happens under the lock and the file is
    /// replaced atomically. A missing run leaves the file untouched.
    pub fn append_addendum(&self, run_number: &str, author: &str, text: &str) -> RunResult<String> {
        let run_number = run_number.trim();
        let (author, text) = (author.trim(), text.trim());
        if text.is_empty() {
            return Err(RunError::InvalidInput("addendum text is required".to_string()));
        }
        if author.is_empty() {
            return Err(RunError::InvalidInput("addendum author is required".to_string()));
        }
        if text.contains(['\n', '\r']) || author.contains(['\n', '\r']) {
            return Err(RunError::InvalidInput(
                "addendum must be a single line".to_string(),
            ));
        }

        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let mut runs = self
            .read()?
            .map(|contents| codec::parse(&contents))
            .unwrap_or_default();

        let entry = format!("[{}] {}: {}", now_timestamp(), author, text);
        let run = runs
            .iter_mut()
            .find(|run| run.run_number == run_number)
            .ok_or_else(|| RunError::RunNotFound(run_number.to_string()))?;
        run.addendums.push(entry.clone());

        fs::replace(&self.path, &codec::encode_all(&runs))?;
        info!("{} added an addendum to run {}", author, run_number);
        Ok(entry)
    }

    fn read(&self) -> StoreResult<Option<String>> {
        fs::read_optional(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitStatus;
    use common::StoreError;
    use common::lock::DEFAULT_LOCK_TIMEOUT;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> RunLogStore {
        RunLogStore::new(dir.path().join("run_log.txt"), DEFAULT_LOCK_TIMEOUT)
    }

    fn new_run(number: &str, assigned: &str) -> NewRun {
        NewRun {
            run_number: number.to_string(),
            caller: "Front gate".to_string(),
            location: "Warehouse 3".to_string(),
            nature: "Chest pain".to_string(),
            assigned: assigned.to_string(),
            notes: "Call Received\nPatient alert".to_string(),
            timestamp: Some("2025-03-02 14:05:11".to_string()),
            statuses: vec![UnitStatus::new("41", "ENROUTE", "2025-03-02 14:06:00")],
        }
    }

    #[test]
    fn test_written_run_reads_back() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let written = store.append_run(new_run("101", "41, E1")).unwrap();
        let read = store.find_run("101").unwrap();

        assert_eq!(read, written);
        assert_eq!(read.caller, "Front gate");
        assert_eq!(read.location, "Warehouse 3");
        assert_eq!(read.nature, "Chest pain");
        assert_eq!(read.assigned, "41, E1");
        assert_eq!(read.notes, "Call Received\nPatient alert");
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut run = new_run("102", "41");
        run.timestamp = None;

        let written = store.append_run(run).unwrap();
        assert_eq!(written.timestamp.len(), "2025-03-02 14:05:11".len());
    }

    #[test]
    fn test_invalid_run_is_not_written() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut run = new_run("103", "41");
        run.notes = "=== RUN END ===".to_string();

        assert!(matches!(store.append_run(run), Err(RunError::InvalidInput(_))));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_missing_log_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.list_runs().unwrap().is_empty());
        assert!(matches!(store.find_run("1"), Err(RunError::RunNotFound(_))));
    }

    #[test]
    fn test_addendum_targets_first_match() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.append_run(new_run("201", "41")).unwrap();
        store.append_run(new_run("202", "42")).unwrap();

        let entry = store.append_addendum("202", "alex", "patient transported").unwrap();
        assert!(entry.starts_with('['));
        assert!(entry.ends_with("] alex: patient transported"));

        let runs = store.list_runs().unwrap();
        assert!(runs[0].addendums.is_empty());
        assert_eq!(runs[1].addendums, vec![entry]);
    }

    #[test]
    fn test_addendum_to_missing_run_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.append_run(new_run("301", "41")).unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let err = store.append_addendum("999", "alex", "nothing").unwrap_err();
        assert!(matches!(err, RunError::RunNotFound(ref number) if number == "999"));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_addendum_on_empty_log_errors() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(matches!(
            store.append_addendum("1", "alex", "text"),
            Err(RunError::RunNotFound(_))
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_addendum_rejects_blank_text() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.append_run(new_run("401", "41")).unwrap();
        assert!(matches!(
            store.append_addendum("401", "alex", "  "),
            Err(RunError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_held_lock_times_out() {
        let dir = TempDir::new().unwrap();
        let store = RunLogStore::new(dir.path().join("run_log.txt"), Duration::from_millis(100));
        let _held = FileLock::acquire(store.path(), DEFAULT_LOCK_TIMEOUT).unwrap();

        let err = store.append_run(new_run("501", "41")).unwrap_err();
        assert!(matches!(err, RunError::Store(StoreError::LockTimeout { .. })));
    }
}
