//! Run-visibility filter
//!
//! Owners and admins see every run. Anyone else sees a run only when one of
//! the responder identifiers linked to their username is among the run's
//! assigned units. Only digit-only tokens count as responder identifiers;
//! apparatus call signs such as `E1` never grant visibility.

use std::collections::BTreeSet;

use crate::error::AuthResult;
use crate::models::Role;
use crate::repositories::{AdminRepository, ResponderLinks, UserRepository};

/// Anything that carries a run's unit assignment
pub trait Assignment {
    /// Units on the run's primary assignment field
    fn assigned_units(&self) -> Vec<String>;

    /// Secondary list consulted only when the primary list is empty
    fn assigned_responders(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Loaded owner/admin/link tables used to answer visibility questions
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    owners: BTreeSet<String>,
    admins: BTreeSet<String>,
    links: ResponderLinks,
}

impl AccessPolicy {
    /// Policy with a single owner and no admins
    pub fn new(owner: &str, links: ResponderLinks) -> Self {
        Self {
            owners: key(owner).into_iter().collect(),
            admins: BTreeSet::new(),
            links,
        }
    }

    pub fn with_admins<I, S>(mut self, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.admins
            .extend(admins.into_iter().filter_map(|admin| key(admin.as_ref())));
        self
    }

    pub fn with_owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.owners
            .extend(owners.into_iter().filter_map(|owner| key(owner.as_ref())));
        self
    }

    /// Build the policy from the backing files
    ///
    /// Admins are the admin-file entries plus users flagged admin in the
    /// credential file. Users the credential repository recognises as owners
    /// by identifier count as owners alongside the configured owner username.
    pub fn load(users: &UserRepository, admins: &AdminRepository, links: ResponderLinks) -> AuthResult<Self> {
        let table = users.load()?;
        let flagged_admins = table.values().filter(|user| user.is_admin).map(|user| &user.username);
        let identified_owners = table
            .values()
            .filter(|user| users.is_owner(user))
            .map(|user| &user.username);

        Ok(Self::new(admins.owner(), links)
            .with_owners(identified_owners)
            .with_admins(admins.load()?)
            .with_admins(flagged_admins))
    }

    pub fn is_owner(&self, username: &str) -> bool {
        key(username).is_some_and(|username| self.owners.contains(&username))
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.is_owner(username) || key(username).is_some_and(|username| self.admins.contains(&username))
    }

    pub fn role(&self, username: &str) -> Role {
        if self.is_owner(username) {
            Role::Owner
        } else if self.is_admin(username) {
            Role::Admin
        } else {
            Role::Responder
        }
    }

    /// Responder identifiers linked to `username`
    pub fn responder_ids_for(&self, username: &str) -> BTreeSet<String> {
        self.links.responder_ids_for(username)
    }

    /// Decide whether `username` may view `run`
    pub fn can_view<R: Assignment + ?Sized>(&self, username: &str, run: &R) -> bool {
        if self.is_admin(username) {
            return true;
        }

        let mut assigned = run.assigned_units();
        if assigned.iter().all(|unit| unit.trim().is_empty()) {
            assigned = run.assigned_responders();
        }

        let assigned_ids = responder_tokens(&assigned);
        if assigned_ids.is_empty() {
            return false;
        }

        let linked = self.responder_ids_for(username);
        !assigned_ids.is_disjoint(&linked)
    }

    /// Runs `username` may view, in their original order
    pub fn filter_visible<'a, R: Assignment>(&self, username: &str, runs: &'a [R]) -> Vec<&'a R> {
        runs.iter().filter(|run| self.can_view(username, *run)).collect()
    }
}

/// Keep only tokens made entirely of ASCII digits
pub fn responder_tokens<S: AsRef<str>>(units: &[S]) -> BTreeSet<String> {
    units
        .iter()
        .map(|unit| unit.as_ref().trim())
        .filter(|unit| !unit.is_empty() && unit.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

fn key(username: &str) -> Option<String> {
    let username = username.trim();
    (!username.is_empty()).then(|| username.to_lowercase())
}
