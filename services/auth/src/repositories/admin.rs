//! Admin list repository
//!
//! One username per line. The owner is admin whether or not the file lists
//! them, and is never removed.

use common::{FileLock, fs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{AuthError, AuthResult};
use crate::validation::validate_username;

#[derive(Debug, Clone)]
pub struct AdminRepository {
    path: PathBuf,
    owner: String,
    lock_timeout: Duration,
}

impl AdminRepository {
    pub fn new(path: impl Into<PathBuf>, owner: impl Into<String>, lock_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            owner: owner.into().trim().to_string(),
            lock_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Usernames listed in the admin file, in file order
    pub fn load(&self) -> AuthResult<Vec<String>> {
        let contents = fs::read_optional(&self.path)?.unwrap_or_default();
        Ok(parse_admins(&contents))
    }

    pub fn is_owner(&self, username: &str) -> bool {
        let username = username.trim();
        !username.is_empty() && username.eq_ignore_ascii_case(&self.owner)
    }

    pub fn is_admin(&self, username: &str) -> AuthResult<bool> {
        if self.is_owner(username) {
            return Ok(true);
        }
        let username = username.trim();
        Ok(self
            .load()?
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(username)))
    }

    /// Add a username to the admin file
    ///
    /// Returns `false` when the user already had admin status.
    pub fn promote(&self, username: &str) -> AuthResult<bool> {
        let username = username.trim();
        validate_username(username).map_err(AuthError::InvalidInput)?;

        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        if self.is_admin(username)? {
            return Ok(false);
        }

        let contents = fs::read_optional(&self.path)?.unwrap_or_default();
        let mut line = String::new();
        if !contents.is_empty() && !contents.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(username);
        line.push('\n');
        fs::append(&self.path, &line)?;

        info!("Promoted {} to admin", username);
        Ok(true)
    }

    /// Remove a username from the admin file
    ///
    /// The owner is refused and the file is left untouched. Returns `false`
    /// when the user was not listed.
    pub fn demote(&self, username: &str) -> AuthResult<bool> {
        let username = username.trim();
        if self.is_owner(username) {
            return Err(AuthError::OwnerProtected(self.owner.clone()));
        }

        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let Some(contents) = fs::read_optional(&self.path)? else {
            return Ok(false);
        };

        let mut removed = false;
        let mut kept = String::new();
        for line in contents.lines() {
            if line.trim().eq_ignore_ascii_case(username) {
                removed = true;
                continue;
            }
            kept.push_str(line);
            kept.push('\n');
        }

        if removed {
            fs::replace(&self.path, &kept)?;
            info!("Demoted {} from admin", username);
        }
        Ok(removed)
    }

    /// Admins shown in management listings; the owner is hidden
    pub fn visible_admins(&self) -> AuthResult<Vec<String>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|admin| !self.is_owner(admin))
            .collect())
    }
}

fn parse_admins(contents: &str) -> Vec<String> {
    let mut admins: Vec<String> = Vec::new();
    for line in contents.lines() {
        let name = line.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        if !admins.iter().any(|known| known.eq_ignore_ascii_case(name)) {
            admins.push(name.to_string());
        }
    }
    admins
}
