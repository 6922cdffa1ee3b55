//! Responder-link map: which login usernames may act as which responder
//!
//! The file is a hand-maintained JSON object such as
//! `{"41": ["dakota"], "42": ["alex", "jordan"], "43": "kelsey"}`.

use common::fs;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::AuthResult;
use crate::models::UserRecord;

/// Responder identifier to lower-cased usernames
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponderLinks {
    links: BTreeMap<String, Vec<String>>,
}

impl ResponderLinks {
    /// Load the map; a missing or unparsable file gives an empty map
    pub fn load(path: &Path) -> AuthResult<Self> {
        let Some(contents) = fs::read_optional(path)? else {
            return Ok(Self::default());
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => Ok(Self::from_json(&value)),
            Err(e) => {
                warn!("Ignoring unreadable responder links {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Build from a parsed JSON document, skipping entries of the wrong shape
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            warn!("Responder links must be a JSON object");
            return Self::default();
        };

        let mut links = BTreeMap::new();
        for (key, entry) in object {
            let id = key.trim();
            if id.is_empty() {
                continue;
            }

            let usernames: Vec<String> = match entry {
                Value::String(name) => normalize(name).into_iter().collect(),
                Value::Array(items) => items.iter().filter_map(scalar_name).collect(),
                other => {
                    debug!("Skipping responder link {} with value {}", id, other);
                    continue;
                }
            };
            links.insert(id.to_string(), usernames);
        }

        Self { links }
    }

    /// Build from explicit pairs of responder id and usernames
    pub fn from_pairs<I, K, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, U)>,
        K: Into<String>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        let links = pairs
            .into_iter()
            .map(|(id, users)| {
                let users = users
                    .into_iter()
                    .filter_map(|user| normalize(user.as_ref()))
                    .collect();
                (id.into().trim().to_string(), users)
            })
            .collect();
        Self { links }
    }

    /// Responder identifiers linked to `username`
    pub fn responder_ids_for(&self, username: &str) -> BTreeSet<String> {
        let Some(username) = normalize(username) else {
            return BTreeSet::new();
        };

        self.links
            .iter()
            .filter(|(_, users)| users.contains(&username))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Link entries naming a username absent from the credential table
    pub fn unknown_usernames(&self, users: &BTreeMap<String, UserRecord>) -> Vec<(String, String)> {
        self.links
            .iter()
            .flat_map(|(id, names)| names.iter().map(move |name| (id, name)))
            .filter(|(_, name)| !users.contains_key(name.as_str()))
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

fn normalize(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_lowercase())
}

fn scalar_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => normalize(name),
        Value::Number(number) => normalize(&number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_string_and_array_values() {
        let links = ResponderLinks::from_json(&json!({
            "41": ["Dakota"],
            "42": ["alex", " jordan "],
            "43": "alex",
        }));

        assert_eq!(
            links.responder_ids_for("ALEX"),
            BTreeSet::from(["42".to_string(), "43".to_string()])
        );
        assert_eq!(
            links.responder_ids_for("dakota"),
            BTreeSet::from(["41".to_string()])
        );
        assert!(links.responder_ids_for("").is_empty());
    }

    #[test]
    fn test_malformed_entries_are_skipped_individually() {
        let links = ResponderLinks::from_json(&json!({
            "41": {"user": "alex"},
            "42": 7,
            "": ["ghost"],
            "43": ["alex", null, ""],
        }));

        assert_eq!(
            links.responder_ids_for("alex"),
            BTreeSet::from(["43".to_string()])
        );
        assert!(links.responder_ids_for("ghost").is_empty());
    }

    #[test]
    fn test_missing_and_broken_files_are_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("responder_users.json");
        assert!(ResponderLinks::load(&path).unwrap().is_empty());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(ResponderLinks::load(&path).unwrap().is_empty());

        std::fs::write(&path, "[\"41\"]").unwrap();
        assert!(ResponderLinks::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_keeps_readable_links() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("responder_users.json");
        std::fs::write(&path, b"{\"41\": [\"chris\"], \"42\": [\"x\xff\"]}").unwrap();

        let links = ResponderLinks::load(&path).unwrap();
        assert_eq!(links.responder_ids_for("chris"), BTreeSet::from(["41".to_string()]));

        std::fs::write(&path, b"\xff\xfe{").unwrap();
        assert!(ResponderLinks::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_usernames() {
        let links = ResponderLinks::from_pairs([("41", vec!["alex"]), ("42", vec!["ghost"])]);
        let mut users = BTreeMap::new();
        users.insert(
            "alex".to_string(),
            UserRecord::parse_line("alex,pw,Alex,Ross,41,0,0").unwrap(),
        );

        assert_eq!(
            links.unknown_usernames(&users),
            vec![("42".to_string(), "ghost".to_string())]
        );
    }
}
