//! Application settings
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional settings file, then `DISPATCH_*` environment variables.

use crate::error::SettingsError;
use crate::lock::DEFAULT_LOCK_TIMEOUT;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Owner account used when no setting names one
pub const DEFAULT_OWNER_USERNAME: &str = "Dakota";

/// Locations of the shared files and the knobs around them
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Directory that relative file names resolve against
    pub data_dir: PathBuf,
    pub users_file: PathBuf,
    pub admin_file: PathBuf,
    pub responder_links_file: PathBuf,
    pub run_log_file: PathBuf,
    pub responders_file: PathBuf,
    pub shift_log_dir: PathBuf,
    /// The account that is always admin and can never be demoted
    pub owner_username: String,
    /// Identifier codes that also mark their holder as owner
    #[serde(default)]
    pub owner_identifiers: Vec<String>,
    pub lock_timeout_ms: u64,
    pub weather_url: String,
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment
    ///
    /// # Environment Variables
    /// Every key can be overridden with `DISPATCH_<KEY>`, e.g.
    /// `DISPATCH_DATA_DIR=/srv/dispatch` or `DISPATCH_OWNER_USERNAME=chief`.
    /// `DISPATCH_OWNER_IDENTIFIERS` takes a comma-separated list.
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("data_dir", ".")?
            .set_default("users_file", "users.txt")?
            .set_default("admin_file", "admin_users.txt")?
            .set_default("responder_links_file", "responder_users.json")?
            .set_default("run_log_file", "run_log.txt")?
            .set_default("responders_file", "responders.txt")?
            .set_default("shift_log_dir", "shift_logs")?
            .set_default("owner_username", DEFAULT_OWNER_USERNAME)?
            .set_default("lock_timeout_ms", DEFAULT_LOCK_TIMEOUT.as_millis() as i64)?
            .set_default("weather_url", "http://perryweather.com")?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("DISPATCH")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("owner_identifiers"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Resolve a configured file name against `data_dir`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn users_path(&self) -> PathBuf {
        self.resolve(&self.users_file)
    }

    pub fn admin_path(&self) -> PathBuf {
        self.resolve(&self.admin_file)
    }

    pub fn responder_links_path(&self) -> PathBuf {
        self.resolve(&self.responder_links_file)
    }

    pub fn run_log_path(&self) -> PathBuf {
        self.resolve(&self.run_log_file)
    }

    pub fn responders_path(&self) -> PathBuf {
        self.resolve(&self.responders_file)
    }

    pub fn shift_log_path(&self) -> PathBuf {
        self.resolve(&self.shift_log_dir)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
