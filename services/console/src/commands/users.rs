//! Login, user and admin commands

use anyhow::Result;
use auth::{AuthError, NewUser, ProfileUpdate, Role};
use tracing::warn;

use crate::app::App;
use crate::cli::{AdminCommands, Identity, UserCommands};

pub fn login(app: &App, identity: &Identity) -> Result<()> {
    let session = app.sign_in(identity)?;
    println!("Signed in as {} ({})", session.username, session.role);
    if session.must_change_password {
        println!("Your password is temporary; set a new one with `dispatch user passwd --new-password ...`.");
    }
    Ok(())
}

pub fn user(app: &App, identity: &Identity, command: UserCommands) -> Result<()> {
    match command {
        UserCommands::Add {
            username,
            temp_password,
            first,
            last,
            identifier,
            admin,
            permanent,
        } => {
            let session = app.sign_in_active(identity)?;
            session.require_admin()?;
            if admin {
                session.require_owner()?;
            }

            let created = app.users.create(NewUser {
                username,
                password: temp_password,
                first_name: first,
                last_name: last,
                identifier,
                is_temp: !permanent,
                is_admin: admin,
            })?;
            println!("Created user {}", created.username);
        }

        UserCommands::Passwd {
            username,
            new_password,
        } => {
            let session = app.sign_in(identity)?;
            let target = username.unwrap_or_else(|| session.username.clone());

            if target.trim().eq_ignore_ascii_case(&session.username) {
                app.users.set_password(&session.username, &new_password)?;
                println!("Password updated");
            } else {
                session.require_active()?;
                session.require_admin()?;
                let updated = app.users.reset_to_temporary(&target, &new_password)?;
                println!(
                    "Temporary password issued to {}; it must be changed at next login",
                    updated.username
                );
            }
        }

        UserCommands::Edit {
            username,
            first,
            last,
            identifier,
            temp_password,
        } => {
            let session = app.sign_in_active(identity)?;
            session.require_admin()?;
            if app.policy()?.is_owner(&username) {
                session.require_owner()?;
            }

            let updated = app.users.update_profile(
                &username,
                ProfileUpdate {
                    first_name: first,
                    last_name: last,
                    identifier,
                    password: temp_password,
                },
            )?;
            println!("Updated user {}", updated.username);
        }

        UserCommands::Delete { username } => {
            let session = app.sign_in_active(identity)?;
            session.require_admin()?;
            if username.trim().eq_ignore_ascii_case(&session.username) {
                return Err(AuthError::PermissionDenied("cannot delete your own account".to_string()).into());
            }
            if app.policy()?.is_owner(&username) {
                return Err(AuthError::OwnerProtected(username.trim().to_string()).into());
            }

            // revoke admin before the credential line goes
            app.admins.demote(&username)?;
            app.users.delete(&username)?;
            println!("Deleted user {}", username.trim());
        }

        UserCommands::List => {
            let session = app.sign_in_active(identity)?;
            session.require_admin()?;
            let policy = app.policy()?;

            for user in app.users.list()? {
                let role = policy.role(&user.username);
                let temp = if user.is_temp { " [temporary password]" } else { "" };
                println!(
                    "{:<16} {:<24} {:<10} {}{}",
                    user.username,
                    user.full_name(),
                    user.identifier,
                    role,
                    temp
                );
            }
        }
    }
    Ok(())
}

pub fn admin(app: &App, identity: &Identity, command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::Promote { username } => {
            let session = app.sign_in_active(identity)?;
            session.require_owner()?;

            let user = app
                .users
                .find(&username)?
                .ok_or_else(|| AuthError::UserNotFound(username.trim().to_string()))?;
            if app.admins.promote(&user.username)? {
                println!("{} is now an admin", user.username);
            } else {
                println!("{} is already an admin", user.username);
            }
        }

        AdminCommands::Demote { username } => {
            let session = app.sign_in_active(identity)?;
            session.require_owner()?;
            if app.policy()?.is_owner(&username) {
                return Err(AuthError::OwnerProtected(username.trim().to_string()).into());
            }

            let removed = app.admins.demote(&username)?;
            let flagged = app.users.find(&username)?.is_some_and(|user| user.is_admin);
            if flagged {
                app.users.set_admin_flag(&username, false)?;
            }

            if removed || flagged {
                println!("{} is no longer an admin", username.trim());
            } else {
                println!("{} was not an admin", username.trim());
            }
        }

        AdminCommands::List => {
            let session = app.sign_in_active(identity)?;
            session.require_admin()?;

            let policy = app.policy()?;
            let users = app.users.load()?;
            let mut admins = app.admins.visible_admins()?;
            admins.retain(|admin| !policy.is_owner(admin));
            for user in users.values() {
                if policy.role(&user.username) == Role::Admin
                    && !admins.iter().any(|admin| admin.eq_ignore_ascii_case(&user.username))
                {
                    admins.push(user.username.clone());
                }
            }
            admins.sort_by_key(|admin| admin.to_lowercase());

            if admins.is_empty() {
                println!("No admins besides the owner");
            }
            for admin in admins {
                println!("{admin}");
            }

            for (id, name) in app.links()?.unknown_usernames(&users) {
                warn!("Responder link {} names unknown user {}", id, name);
            }
        }
    }
    Ok(())
}
