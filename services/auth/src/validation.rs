//! Input validation utilities
//!
//! The credential and admin files are comma- and line-delimited, so any
//! value containing a comma or a line break would corrupt them.

use regex::Regex;
use std::sync::OnceLock;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(
            "Username can only contain letters, numbers, dots, dashes and underscores".to_string(),
        );
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.trim().is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if password.trim() != password {
        return Err("Password cannot start or end with whitespace".to_string());
    }

    validate_field("Password", password)
}

/// Validate a free-form record field such as a name or identifier
pub fn validate_field(label: &str, value: &str) -> Result<(), String> {
    if value.contains(',') {
        return Err(format!("{label} cannot contain a comma"));
    }

    if value.contains(['\n', '\r']) {
        return Err(format!("{label} cannot contain a line break"));
    }

    Ok(())
}
