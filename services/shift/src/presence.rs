//! Who is typing in the shift log
//!
//! State lives in `<dir>/typing_state.json` as
//! `{"shifts": {"SHIFT_A": {"alex": {"typing": true, "ts": "..."}}}}`.

use chrono::Local;
use common::{FileLock, fs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::ShiftResult;
use crate::shift::Shift;

pub const TYPING_STATE_FILE: &str = "typing_state.json";

/// Minimum spacing between two "typing" emits from one tracker
pub const TYPING_THROTTLE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingEntry {
    pub typing: bool,
    pub ts: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingState {
    #[serde(default)]
    pub shifts: BTreeMap<String, BTreeMap<String, TypingEntry>>,
}

impl TypingState {
    /// Load the state; a missing or unreadable file is empty
    pub fn load(path: &Path) -> ShiftResult<Self> {
        let Some(contents) = fs::read_optional(path)? else {
            return Ok(Self::default());
        };
        match serde_json::from_str(&contents) {
            Ok(state) => Ok(state),
            Err(e) => {
                debug!("Ignoring unreadable typing state {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Users currently flagged as typing on `shift`, sorted
    pub fn typists(&self, shift: Shift) -> Vec<String> {
        self.shifts
            .get(shift.key())
            .map(|users| {
                users
                    .iter()
                    .filter(|(_, entry)| entry.typing)
                    .map(|(user, _)| user.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Indicator text for a list of typists
pub fn typing_label(typists: &[String]) -> String {
    match typists {
        [] => "No one is typing…".to_string(),
        [one] => format!("{one} is typing…"),
        many => format!("{} are typing…", many.join(", ")),
    }
}

/// Publishes one user's typing flag for one shift
#[derive(Debug)]
pub struct PresenceTracker {
    path: PathBuf,
    shift: Shift,
    username: String,
    lock_timeout: Duration,
    last_emit: Option<Instant>,
}

impl PresenceTracker {
    pub fn new(dir: &Path, shift: Shift, username: impl Into<String>, lock_timeout: Duration) -> Self {
        Self {
            path: dir.join(TYPING_STATE_FILE),
            shift,
            username: username.into(),
            lock_timeout,
            last_emit: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the user's typing flag; returns false when throttled
    ///
    /// A `true` emit within [`TYPING_THROTTLE`] of the previous emit is
    /// dropped. Clearing the flag is always written.
    pub fn set_typing(&mut self, typing: bool) -> ShiftResult<bool> {
        let now = Instant::now();
        if typing
            && self
                .last_emit
                .is_some_and(|last| now.duration_since(last) < TYPING_THROTTLE)
        {
            return Ok(false);
        }
        self.last_emit = Some(now);

        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let mut state = TypingState::load(&self.path)?;
        state.shifts.entry(self.shift.key().to_string()).or_default().insert(
            self.username.clone(),
            TypingEntry {
                typing,
                ts: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        );
        fs::replace(&self.path, &serde_json::to_string(&state).map_err(common::StoreError::from)?)?;
        Ok(true)
    }

    pub fn typists(&self) -> ShiftResult<Vec<String>> {
        Ok(TypingState::load(&self.path)?.typists(self.shift))
    }

    pub fn label(&self) -> ShiftResult<String> {
        Ok(typing_label(&self.typists()?))
    }
}
