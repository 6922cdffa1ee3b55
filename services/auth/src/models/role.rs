//! Role model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Privilege level of a signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Responder,
    Admin,
    Owner,
}

impl Role {
    /// Owners and admins see every run and manage users
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Responder => "Responder",
            Role::Admin => "Admin",
            Role::Owner => "Owner",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_outranks_admin() {
        assert!(Role::Owner > Role::Admin);
        assert!(Role::Admin > Role::Responder);
        assert!(Role::Owner.is_admin());
        assert!(!Role::Responder.is_admin());
    }
}
