//! Login and signed-in session

use serde::Serialize;
use tracing::{info, warn};

use crate::access::AccessPolicy;
use crate::error::{AuthError, AuthResult};
use crate::models::Role;
use crate::repositories::UserRepository;

/// A user that passed the credential check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Username as spelled in the credential file
    pub username: String,
    pub role: Role,
    /// The password was issued by an admin and must be changed before use
    pub must_change_password: bool,
}

impl Session {
    pub fn require_admin(&self) -> AuthResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(format!(
                "{} is not an admin",
                self.username
            )))
        }
    }

    pub fn require_owner(&self) -> AuthResult<()> {
        if self.role == Role::Owner {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(format!(
                "{} is not the owner",
                self.username
            )))
        }
    }

    /// Refuse to act until a temporary password has been replaced
    pub fn require_active(&self) -> AuthResult<()> {
        if self.must_change_password {
            Err(AuthError::PermissionDenied(
                "temporary password must be changed first".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Check credentials and resolve the user's role
pub fn login(
    users: &UserRepository,
    policy: &AccessPolicy,
    username: &str,
    password: &str,
) -> AuthResult<Session> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let Some(user) = users.verify_credentials(username, password)? else {
        warn!("Failed login for {}", username.trim());
        return Err(AuthError::InvalidCredentials);
    };

    let session = Session {
        role: policy.role(&user.username),
        must_change_password: user.is_temp,
        username: user.username,
    };
    info!("{} signed in as {}", session.username, session.role);
    Ok(session)
}
