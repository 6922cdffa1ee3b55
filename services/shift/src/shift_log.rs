//! Daily shift log shared by the crew on duty
//!
//! Each shift writes to `<dir>/<YYYY-MM-DD>_SHIFT_X_current.txt` until the
//! end of the shift, when the log is archived to a summary file next to it.

use chrono::{Local, NaiveDate};
use common::{FileLock, StoreError, fs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ShiftError, ShiftResult};
use crate::shift::Shift;

pub const SUMMARY_TITLE: &str = "PPM Shift Summary";
pub const ATTENTION_MARKER: &str = "***NEEDS ATTENTION***";
const DATE_FORMAT: &str = "%Y-%m-%d";
const RULE_WIDTH: usize = 60;

/// One shift's log for one day
#[derive(Debug, Clone)]
pub struct ShiftLog {
    dir: PathBuf,
    shift: Shift,
    date: NaiveDate,
    lock_timeout: Duration,
}

impl ShiftLog {
    pub fn new(dir: impl Into<PathBuf>, shift: Shift, date: NaiveDate, lock_timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            shift,
            date,
            lock_timeout,
        }
    }

    /// Log for today's local date
    pub fn today(dir: impl Into<PathBuf>, shift: Shift, lock_timeout: Duration) -> Self {
        Self::new(dir, shift, Local::now().date_naive(), lock_timeout)
    }

    fn stem(&self) -> String {
        format!("{}_{}", self.date.format(DATE_FORMAT), self.shift.key())
    }

    pub fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}_current.txt", self.stem()))
    }

    /// Summary path; suffix `n` gives `..._summary_n.txt`
    pub fn summary_path(&self, suffix: Option<u32>) -> PathBuf {
        match suffix {
            Some(n) => self.dir.join(format!("{}_summary_{}.txt", self.stem(), n)),
            None => self.dir.join(format!("{}_summary.txt", self.stem())),
        }
    }

    /// Append one line under the log's lock
    pub fn append_line(&self, line: &str) -> ShiftResult<()> {
        let line = single_line(line)?;
        let path = self.current_path();
        let _lock = FileLock::acquire(&path, self.lock_timeout)?;
        fs::append(&path, &format!("{line}\n"))?;
        Ok(())
    }

    /// Post `username: message`
    pub fn post_note(&self, username: &str, message: &str) -> ShiftResult<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ShiftError::InvalidInput("note is empty".to_string()));
        }
        self.append_line(&format!("{}: {}", username.trim(), message))
    }

    /// Whole current log; empty when nothing has been written today
    pub fn read_all(&self) -> ShiftResult<String> {
        Ok(fs::read_optional(&self.current_path())?.unwrap_or_default())
    }

    /// Post a highlighted needs-attention line
    pub fn mark_attention(
        &self,
        username: &str,
        description: Option<&str>,
        responders: Option<&str>,
    ) -> ShiftResult<()> {
        let mut line = format!("{}: {}", username.trim(), ATTENTION_MARKER);
        if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
            line.push_str(&format!(" - {description}"));
        }
        if let Some(responders) = responders.map(str::trim).filter(|r| !r.is_empty()) {
            line.push_str(&format!(" - Responders: {responders}"));
        }
        self.append_line(&line)?;
        info!("{} flagged {} as needing attention", username.trim(), self.shift);
        Ok(())
    }

    /// Close the shift: write a summary with a header and remove the current log
    ///
    /// The first free summary name is used, so archiving twice in a day keeps
    /// both summaries.
    pub fn archive(&self, username: &str) -> ShiftResult<PathBuf> {
        let current = self.current_path();
        let _lock = FileLock::acquire(&current, self.lock_timeout)?;
        if !current.exists() {
            return Err(ShiftError::NothingToArchive(self.stem()));
        }

        fs::append(&current, &format!("{}: Shift ended; archiving.\n", username.trim()))?;
        let content = fs::read_optional(&current)?.unwrap_or_default();

        let summary = format!(
            "{}\nDate: {}\nShift: {}\nArchived by: {}\n{}\n\n{}",
            SUMMARY_TITLE,
            self.date.format(DATE_FORMAT),
            self.shift.key(),
            username.trim(),
            "=".repeat(RULE_WIDTH),
            content
        );

        let out = self.free_summary_path();
        fs::replace(&out, &summary)?;
        std::fs::remove_file(&current).map_err(|e| StoreError::io(&current, e))?;

        info!("{} archived {} to {}", username.trim(), self.shift, out.display());
        Ok(out)
    }

    fn free_summary_path(&self) -> PathBuf {
        let mut path = self.summary_path(None);
        let mut n = 1;
        while path.exists() {
            debug!("Summary {} exists, trying suffix {}", path.display(), n);
            path = self.summary_path(Some(n));
            n += 1;
        }
        path
    }
}

/// Archived summary file names in `dir` containing `query` (any case), sorted
pub fn list_summaries(dir: &Path, query: &str) -> ShiftResult<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(dir, e).into()),
    };

    let query = query.trim().to_lowercase();
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".txt") && name.contains("_summary"))
        .filter(|name| name.to_lowercase().contains(&query))
        .collect();
    names.sort();
    Ok(names)
}

/// Contents of one archived summary, by file name
pub fn read_summary(dir: &Path, name: &str) -> ShiftResult<String> {
    let name = name.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(ShiftError::SummaryNotFound(name.to_string()));
    }
    fs::read_optional(&dir.join(name))?.ok_or_else(|| ShiftError::SummaryNotFound(name.to_string()))
}

fn single_line(line: &str) -> ShiftResult<&str> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return Err(ShiftError::InvalidInput("line is empty".to_string()));
    }
    if line.contains(['\n', '\r']) {
        return Err(ShiftError::InvalidInput(
            "shift log entries must be a single line".to_string(),
        ));
    }
    Ok(line)
}
