//! Error types for the auth crate

use common::StoreError;
use thiserror::Error;

/// Custom error type for credential and role operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// A field failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Username already present in the credential file
    #[error("User '{0}' already exists")]
    DuplicateUsername(String),

    /// No credential record for this username
    #[error("User '{0}' not found")]
    UserNotFound(String),

    /// Attempt to demote or delete the owner account
    #[error("The owner account '{0}' cannot be demoted or deleted")]
    OwnerProtected(String),

    /// Login rejected
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The session lacks the role the action needs
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Backing file error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Type alias for auth results
pub type AuthResult<T> = Result<T, AuthError>;
