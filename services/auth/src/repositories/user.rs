//! User repository over the flat credential file

use common::{FileLock, StoreResult, fs};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, ProfileUpdate, UserRecord};
use crate::validation::{validate_field, validate_password, validate_username};

/// User repository
#[derive(Debug, Clone)]
pub struct UserRepository {
    path: PathBuf,
    owner: String,
    owner_identifiers: BTreeSet<String>,
    lock_timeout: Duration,
}

impl UserRepository {
    /// Create a new user repository
    ///
    /// `owner` names the account that can never be deleted.
    pub fn new(path: impl Into<PathBuf>, owner: impl Into<String>, lock_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            owner: owner.into().trim().to_string(),
            owner_identifiers: BTreeSet::new(),
            lock_timeout,
        }
    }

    /// Users carrying one of these identifiers are owners too
    pub fn with_owner_identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.owner_identifiers.extend(
            identifiers
                .into_iter()
                .map(|id| id.as_ref().trim().to_uppercase())
                .filter(|id| !id.is_empty()),
        );
        self
    }

    /// Owner by username or by identifier
    pub fn is_owner(&self, user: &UserRecord) -> bool {
        user.username.eq_ignore_ascii_case(&self.owner) || self.owner_identifiers.contains(&user.identifier)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every well-formed record, keyed by lower-cased username
    ///
    /// A missing file is an empty table. Malformed lines are skipped.
    pub fn load(&self) -> AuthResult<BTreeMap<String, UserRecord>> {
        Ok(parse_users(&self.read()?))
    }

    /// All users sorted by username
    pub fn list(&self) -> AuthResult<Vec<UserRecord>> {
        Ok(self.load()?.into_values().collect())
    }

    /// Find a user by username (case-insensitive)
    pub fn find(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        let key = username.trim().to_lowercase();
        Ok(self.load()?.remove(&key))
    }

    /// Check a username/password pair
    ///
    /// Returns the matching record, or `None` when either is wrong or empty.
    pub fn verify_credentials(&self, username: &str, password: &str) -> AuthResult<Option<UserRecord>> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Ok(None);
        }

        Ok(self.find(username)?.filter(|user| user.password == password))
    }

    /// Create a new user
    pub fn create(&self, new_user: NewUser) -> AuthResult<UserRecord> {
        let record = UserRecord::from(new_user);
        validate_username(&record.username).map_err(AuthError::InvalidInput)?;
        validate_password(&record.password).map_err(AuthError::InvalidInput)?;
        validate_field("First name", &record.first_name).map_err(AuthError::InvalidInput)?;
        validate_field("Last name", &record.last_name).map_err(AuthError::InvalidInput)?;
        validate_field("Identifier", &record.identifier).map_err(AuthError::InvalidInput)?;

        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let contents = self.read()?;
        if parse_users(&contents).contains_key(&record.key()) {
            return Err(AuthError::DuplicateUsername(record.username));
        }

        let mut line = String::new();
        if !contents.is_empty() && !contents.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(&record.to_line());
        line.push('\n');
        fs::append(&self.path, &line)?;

        info!("Created user: {}", record.username);
        Ok(record)
    }

    /// Set a user's password and clear the temporary-password flag
    pub fn set_password(&self, username: &str, new_password: &str) -> AuthResult<UserRecord> {
        validate_password(new_password).map_err(AuthError::InvalidInput)?;

        let updated = self.update(username, |user| {
            user.password = new_password.to_string();
            user.is_temp = false;
        })?;

        info!("Password updated for user: {}", updated.username);
        Ok(updated)
    }

    /// Issue an admin-chosen password that must be changed at next login
    pub fn reset_to_temporary(&self, username: &str, temp_password: &str) -> AuthResult<UserRecord> {
        validate_password(temp_password).map_err(AuthError::InvalidInput)?;

        let updated = self.update(username, |user| {
            user.password = temp_password.to_string();
            user.is_temp = true;
        })?;

        info!("Temporary password issued for user: {}", updated.username);
        Ok(updated)
    }

    /// Set or clear the admin flag column
    pub fn set_admin_flag(&self, username: &str, is_admin: bool) -> AuthResult<UserRecord> {
        self.update(username, |user| user.is_admin = is_admin)
    }

    /// Apply an admin's profile edit
    ///
    /// A new password is stored as temporary, like [`Self::reset_to_temporary`].
    pub fn update_profile(&self, username: &str, update: ProfileUpdate) -> AuthResult<UserRecord> {
        let fields = [
            ("First name", &update.first_name),
            ("Last name", &update.last_name),
            ("Identifier", &update.identifier),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                validate_field(label, value).map_err(AuthError::InvalidInput)?;
            }
        }
        if let Some(password) = &update.password {
            validate_password(password).map_err(AuthError::InvalidInput)?;
        }

        let updated = self.update(username, |user| {
            if let Some(first_name) = update.first_name {
                user.first_name = first_name.trim().to_string();
            }
            if let Some(last_name) = update.last_name {
                user.last_name = last_name.trim().to_string();
            }
            if let Some(identifier) = update.identifier {
                user.identifier = identifier.trim().to_uppercase();
            }
            if let Some(password) = update.password {
                user.password = password;
                user.is_temp = true;
            }
        })?;

        info!("Profile updated for user: {}", updated.username);
        Ok(updated)
    }

    /// Delete a user; owner accounts are refused
    pub fn delete(&self, username: &str) -> AuthResult<()> {
        let key = username.trim().to_lowercase();
        if key == self.owner.to_lowercase() {
            return Err(AuthError::OwnerProtected(self.owner.clone()));
        }

        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let contents = self.read()?;

        let mut target = None;
        let kept: Vec<&str> = contents
            .lines()
            .filter(|line| match UserRecord::parse_line(line) {
                Some(user) if user.key() == key => {
                    target = Some(user);
                    false
                }
                _ => true,
            })
            .collect();

        match target {
            None => return Err(AuthError::UserNotFound(username.trim().to_string())),
            Some(user) if self.is_owner(&user) => return Err(AuthError::OwnerProtected(user.username)),
            Some(_) => {}
        }

        fs::replace(&self.path, &join_lines(kept))?;
        info!("Deleted user: {}", username.trim());
        Ok(())
    }

    /// Rewrite the matching line in place, leaving every other line untouched
    fn update<F>(&self, username: &str, apply: F) -> AuthResult<UserRecord>
    where
        F: FnOnce(&mut UserRecord),
    {
        let key = username.trim().to_lowercase();
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let contents = self.read()?;

        let mut apply = Some(apply);
        let mut updated = None;
        let lines: Vec<String> = contents
            .lines()
            .map(|line| match UserRecord::parse_line(line) {
                Some(mut user) if user.key() == key && updated.is_none() => {
                    if let Some(apply) = apply.take() {
                        apply(&mut user);
                    }
                    let rendered = user.to_line();
                    updated = Some(user);
                    rendered
                }
                _ => line.to_string(),
            })
            .collect();

        let updated = updated.ok_or_else(|| AuthError::UserNotFound(username.trim().to_string()))?;
        fs::replace(&self.path, &join_lines(lines))?;
        Ok(updated)
    }

    fn read(&self) -> StoreResult<String> {
        Ok(fs::read_optional(&self.path)?.unwrap_or_default())
    }
}

fn parse_users(contents: &str) -> BTreeMap<String, UserRecord> {
    let mut users = BTreeMap::new();
    for (number, line) in contents.lines().enumerate() {
        match UserRecord::parse_line(line) {
            Some(user) => {
                users.entry(user.key()).or_insert(user);
            }
            None if !line.trim().is_empty() && !line.trim_start().starts_with('#') => {
                debug!("Skipping malformed credential line {}", number + 1);
            }
            None => {}
        }
    }
    users
}

fn join_lines<S: AsRef<str>>(lines: Vec<S>) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}
