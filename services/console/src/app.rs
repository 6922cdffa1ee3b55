//! Shared handles built once from the settings

use anyhow::{Context, Result, bail};
use auth::{AccessPolicy, AdminRepository, ResponderLinks, Session, UserRepository, login};
use common::Settings;
use runs::RunLogStore;
use shift::{PresenceTracker, RosterRepository, Shift, ShiftLog};
use tracing::warn;

use crate::cli::Identity;

pub struct App {
    pub settings: Settings,
    pub users: UserRepository,
    pub admins: AdminRepository,
    pub runs: RunLogStore,
    pub roster: RosterRepository,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let timeout = settings.lock_timeout();
        let owner = settings.owner_username.clone();
        Self {
            users: UserRepository::new(settings.users_path(), owner.clone(), timeout)
                .with_owner_identifiers(&settings.owner_identifiers),
            admins: AdminRepository::new(settings.admin_path(), owner, timeout),
            runs: RunLogStore::new(settings.run_log_path(), timeout),
            roster: RosterRepository::new(settings.responders_path(), timeout),
            settings,
        }
    }

    pub fn links(&self) -> Result<ResponderLinks> {
        Ok(ResponderLinks::load(&self.settings.responder_links_path())?)
    }

    /// Visibility policy over the current files
    pub fn policy(&self) -> Result<AccessPolicy> {
        Ok(AccessPolicy::load(&self.users, &self.admins, self.links()?)?)
    }

    /// Sign in with the global identity flags
    pub fn sign_in(&self, identity: &Identity) -> Result<Session> {
        let (Some(user), Some(password)) = (identity.user.as_deref(), identity.password.as_deref()) else {
            bail!("this command needs --user and --password");
        };
        let policy = self.policy()?;
        let session = login(&self.users, &policy, user, password)?;
        if session.must_change_password {
            warn!("{} is using a temporary password", session.username);
        }
        Ok(session)
    }

    /// Sign in and refuse sessions still on a temporary password
    pub fn sign_in_active(&self, identity: &Identity) -> Result<Session> {
        let session = self.sign_in(identity)?;
        session
            .require_active()
            .context("run `dispatch user passwd --new-password ...` first")?;
        Ok(session)
    }

    pub fn shift_log(&self, shift: Shift) -> ShiftLog {
        ShiftLog::today(self.settings.shift_log_path(), shift, self.settings.lock_timeout())
    }

    pub fn presence(&self, shift: Shift, username: &str) -> PresenceTracker {
        PresenceTracker::new(
            &self.settings.shift_log_path(),
            shift,
            username,
            self.settings.lock_timeout(),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// App over a scratch data directory seeded with an owner, an admin,
    /// a responder linked to unit 41 and a user on a temporary password
    pub(crate) fn fixture() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("users.txt"),
            "Dakota,boss,Dakota,S,OWNER-001,0,0\n\
             alex,pw,Alex,R,40,0,0\n\
             chris,pw,Chris,P,41,0,0\n\
             new,tmp,New,Hire,44,1,0\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("admin_users.txt"), "alex\n").unwrap();
        std::fs::write(dir.path().join("responder_users.json"), r#"{"41": ["chris"]}"#).unwrap();

        let settings = Settings {
            data_dir: dir.path().to_path_buf(),
            users_file: PathBuf::from("users.txt"),
            admin_file: PathBuf::from("admin_users.txt"),
            responder_links_file: PathBuf::from("responder_users.json"),
            run_log_file: PathBuf::from("run_log.txt"),
            responders_file: PathBuf::from("responders.txt"),
            shift_log_dir: PathBuf::from("shift_logs"),
            owner_username: "Dakota".to_string(),
            owner_identifiers: Vec::new(),
            lock_timeout_ms: 2000,
            weather_url: "http://127.0.0.1:9".to_string(),
        };
        (dir, App::new(settings))
    }

    pub(crate) fn identity(user: &str, password: &str) -> Identity {
        Identity {
            user: Some(user.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn test_sign_in_roles() {
        let (_dir, app) = fixture();
        assert_eq!(app.sign_in(&identity("dakota", "boss")).unwrap().role, auth::Role::Owner);
        assert_eq!(app.sign_in(&identity("alex", "pw")).unwrap().role, auth::Role::Admin);
        assert!(app.sign_in(&identity("alex", "nope")).is_err());
        assert!(app.sign_in(&Identity::default()).is_err());
    }

    #[test]
    fn test_temporary_password_blocks_active_commands() {
        let (_dir, app) = fixture();
        assert!(app.sign_in(&identity("new", "tmp")).is_ok());
        assert!(app.sign_in_active(&identity("new", "tmp")).is_err());
    }
}
