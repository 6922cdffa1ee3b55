//! User record model and its line format
//!
//! One user per line in the credential file:
//! `username,password,first,last,identifier,is_temp,is_admin`

use serde::{Deserialize, Serialize};

/// Number of comma-separated fields in a credential line
pub const FIELD_COUNT: usize = 7;

/// User entity as stored in the credential file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Badge/identifier code, kept upper-case
    pub identifier: String,
    /// Password was issued by an admin and must be changed
    pub is_temp: bool,
    pub is_admin: bool,
}

/// New user creation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub identifier: String,
    pub is_temp: bool,
    pub is_admin: bool,
}

/// Profile edit issued by an admin; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub identifier: Option<String>,
    /// Replacement password, issued as temporary
    pub password: Option<String>,
}

impl UserRecord {
    /// Parse one credential line
    ///
    /// Returns `None` for blank lines, `#` comments and lines with fewer
    /// than [`FIELD_COUNT`] fields. Extra trailing fields are ignored.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() < FIELD_COUNT {
            return None;
        }
        if parts[0].is_empty() {
            return None;
        }

        Some(UserRecord {
            username: parts[0].to_string(),
            password: parts[1].to_string(),
            first_name: parts[2].to_string(),
            last_name: parts[3].to_string(),
            identifier: parts[4].to_uppercase(),
            is_temp: parse_flag(parts[5]),
            is_admin: parse_flag(parts[6]),
        })
    }

    /// Render the record as a credential line, without the newline
    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.username,
            self.password,
            self.first_name,
            self.last_name,
            self.identifier,
            flag(self.is_temp),
            flag(self.is_admin),
        )
    }

    /// Lower-cased username used as the table key
    pub fn key(&self) -> String {
        self.username.to_lowercase()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl From<NewUser> for UserRecord {
    fn from(new_user: NewUser) -> Self {
        UserRecord {
            username: new_user.username.trim().to_string(),
            password: new_user.password,
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            identifier: new_user.identifier.trim().to_uppercase(),
            is_temp: new_user.is_temp,
            is_admin: new_user.is_admin,
        }
    }
}

/// Truthy flag values used across the flat files
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
