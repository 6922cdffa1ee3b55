//! Responder roster by shift
//!
//! ```text
//! [A]
//! B1,Bill Mullins,Active,555-0101,bill@example.com
//! 11,Clifford Hicks,,,
//! [B]
//! ...
//! ```
//!
//! Section headers may also be written `SHIFT_A:`. Lines starting with `#`
//! or `;` are comments.

use common::{FileLock, fs};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ShiftError, ShiftResult};
use crate::shift::Shift;

const FIELD_COUNT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Responder {
    pub code: String,
    pub name: String,
    pub status: String,
    pub phone: String,
    pub email: String,
}

impl Responder {
    /// Parse `code,name,status,phone,email`; missing fields are blank and
    /// extra fields ignored. Lines without both code and name give `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split(',').map(str::trim);
        let mut next = || parts.next().unwrap_or_default().to_string();
        let responder = Responder {
            code: next(),
            name: next(),
            status: next(),
            phone: next(),
            email: next(),
        };
        (!responder.code.is_empty() && !responder.name.is_empty()).then_some(responder)
    }

    pub fn to_line(&self) -> String {
        [&self.code, &self.name, &self.status, &self.phone, &self.email]
            .map(|field| field.trim())
            .join(",")
    }

    fn trimmed(&self) -> Self {
        Responder {
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            status: self.status.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }

    fn validate(&self) -> ShiftResult<()> {
        if self.code.trim().is_empty() || self.name.trim().is_empty() {
            return Err(ShiftError::InvalidInput(
                "unit code and name are required".to_string(),
            ));
        }
        let fields = [&self.code, &self.name, &self.status, &self.phone, &self.email];
        if fields.iter().any(|field| field.contains([',', '\n', '\r'])) {
            return Err(ShiftError::InvalidInput(format!(
                "responder fields cannot contain commas or line breaks ({} fields per line)",
                FIELD_COUNT
            )));
        }
        Ok(())
    }
}

/// Sort key: `B<n>` codes by number, then codes with a leading number by
/// that number, then everything else; ties broken by the upper-cased code
pub fn compare_codes(a: &str, b: &str) -> Ordering {
    code_sort_key(a).cmp(&code_sort_key(b))
}

fn code_sort_key(code: &str) -> (u8, u64, String) {
    const UNNUMBERED: u64 = 10_000_000;
    let code = code.trim().to_uppercase();
    let leading_number = |s: &str| {
        let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
        digits.parse::<u64>().unwrap_or(UNNUMBERED)
    };

    match code.strip_prefix('B') {
        Some(rest) => (0, leading_number(rest), code.clone()),
        None => (1, leading_number(&code), code.clone()),
    }
}

/// Responders of all four shifts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    shifts: BTreeMap<Shift, Vec<Responder>>,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            shifts: Shift::ALL.into_iter().map(|shift| (shift, Vec::new())).collect(),
        }
    }
}

impl Roster {
    pub fn parse(contents: &str) -> Self {
        let mut roster = Self::default();
        let mut current: Option<Shift> = None;

        for raw in contents.trim_start_matches('\u{feff}').lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if (line.starts_with('[') && line.ends_with(']')) || line.ends_with(':') {
                let header = line.trim_matches(|c: char| matches!(c, '[' | ']' | ':' | ' ' | '\t'));
                current = header.parse().ok();
                if current.is_none() {
                    debug!("Ignoring roster section {}", line);
                }
                continue;
            }

            let Some(shift) = current else {
                continue;
            };
            match Responder::parse_line(line) {
                Some(responder) => roster.shifts.entry(shift).or_default().push(responder),
                None => debug!("Skipping roster line without code and name: {}", line),
            }
        }

        roster
    }

    /// All four sections, each sorted by unit code
    pub fn render(&self) -> String {
        let mut out = String::new();
        for shift in Shift::ALL {
            out.push_str(&format!("[{}]\n", shift.letter()));
            let mut responders: Vec<&Responder> = self.responders(shift).iter().collect();
            responders.sort_by(|a, b| compare_codes(&a.code, &b.code));
            for responder in responders {
                out.push_str(&responder.to_line());
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    pub fn responders(&self, shift: Shift) -> &[Responder] {
        self.shifts.get(&shift).map(Vec::as_slice).unwrap_or_default()
    }

    /// Add a responder; unit codes are unique within a shift
    pub fn add(&mut self, shift: Shift, responder: Responder) -> ShiftResult<()> {
        responder.validate()?;
        let responder = responder.trimmed();
        if self.contains(shift, &responder.code) {
            return Err(ShiftError::DuplicateResponder {
                code: responder.code,
                shift: shift.to_string(),
            });
        }

        self.insert_sorted(shift, responder);
        Ok(())
    }

    /// Replace the responder filed under `code` in `shift`, possibly under a
    /// new code or in `new_shift`. Returns the previous entry.
    ///
    /// The new code must not clash with another responder of the target
    /// shift; on any error the roster is unchanged.
    pub fn update(
        &mut self,
        shift: Shift,
        code: &str,
        responder: Responder,
        new_shift: Shift,
    ) -> ShiftResult<Responder> {
        responder.validate()?;
        let code = code.trim();
        let responder = responder.trimmed();

        let index = self.position(shift, code)?;
        let clashes = self
            .responders(new_shift)
            .iter()
            .any(|known| known.code == responder.code && !(new_shift == shift && known.code == code));
        if clashes {
            return Err(ShiftError::DuplicateResponder {
                code: responder.code,
                shift: new_shift.to_string(),
            });
        }

        let previous = self.shifts.entry(shift).or_default().remove(index);
        self.insert_sorted(new_shift, responder);
        Ok(previous)
    }

    pub fn remove(&mut self, shift: Shift, code: &str) -> ShiftResult<Responder> {
        let index = self.position(shift, code)?;
        Ok(self.shifts.entry(shift).or_default().remove(index))
    }

    fn contains(&self, shift: Shift, code: &str) -> bool {
        self.responders(shift).iter().any(|known| known.code == code)
    }

    fn position(&self, shift: Shift, code: &str) -> ShiftResult<usize> {
        let code = code.trim();
        self.responders(shift)
            .iter()
            .position(|responder| responder.code == code)
            .ok_or_else(|| ShiftError::ResponderNotFound {
                code: code.to_string(),
                shift: shift.to_string(),
            })
    }

    fn insert_sorted(&mut self, shift: Shift, responder: Responder) {
        let list = self.shifts.entry(shift).or_default();
        list.push(responder);
        list.sort_by(|a, b| compare_codes(&a.code, &b.code));
    }
}

/// Roster file guarded by its advisory lock
#[derive(Debug, Clone)]
pub struct RosterRepository {
    path: PathBuf,
    lock_timeout: Duration,
}

impl RosterRepository {
    pub fn new(path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            lock_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file gives an empty roster
    pub fn load(&self) -> ShiftResult<Roster> {
        Ok(fs::read_optional(&self.path)?
            .map(|contents| Roster::parse(&contents))
            .unwrap_or_default())
    }

    pub fn save(&self, roster: &Roster) -> ShiftResult<()> {
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        fs::replace(&self.path, &roster.render())?;
        Ok(())
    }

    pub fn add(&self, shift: Shift, responder: Responder) -> ShiftResult<()> {
        self.modify(|roster| roster.add(shift, responder.clone()))?;
        info!("Added responder {} to {}", responder.code.trim(), shift);
        Ok(())
    }

    pub fn remove(&self, shift: Shift, code: &str) -> ShiftResult<Responder> {
        let removed = self.modify(|roster| roster.remove(shift, code))?;
        info!("Removed responder {} from {}", removed.code, shift);
        Ok(removed)
    }

    /// Edit a responder in place or move them to another shift
    pub fn update(&self, shift: Shift, code: &str, responder: Responder, new_shift: Shift) -> ShiftResult<Responder> {
        let previous = self.modify(|roster| roster.update(shift, code, responder, new_shift))?;
        info!("Updated responder {} in {} (now in {})", previous.code, shift, new_shift);
        Ok(previous)
    }

    fn modify<T, F>(&self, apply: F) -> ShiftResult<T>
    where
        F: FnOnce(&mut Roster) -> ShiftResult<T>,
    {
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let mut roster = self.load()?;
        let result = apply(&mut roster)?;
        fs::replace(&self.path, &roster.render())?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::lock::DEFAULT_LOCK_TIMEOUT;
    use tempfile::TempDir;

    fn responder(code: &str, name: &str) -> Responder {
        Responder {
            code: code.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_line_pads_and_truncates() {
        let short = Responder::parse_line(" 11 , Clifford Hicks").unwrap();
        assert_eq!(short.code, "11");
        assert_eq!(short.email, "");

        let long = Responder::parse_line("B1,Bill,Active,555,b@x.org,extra,more").unwrap();
        assert_eq!(long.email, "b@x.org");
        assert_eq!(long.to_line(), "B1,Bill,Active,555,b@x.org");

        assert!(Responder::parse_line("12,").is_none());
        assert!(Responder::parse_line(",Nobody").is_none());
    }

    #[test]
    fn test_parse_sections() {
        let roster = Roster::parse(
            "\u{feff}# roster\n[A]\n11,Cliff\n\nSHIFT_B:\nB2,Bea\n; note\n[X]\n99,Lost\n[c]\n7,Cy\n",
        );
        assert_eq!(roster.responders(Shift::A), &[responder("11", "Cliff")]);
        assert_eq!(roster.responders(Shift::B), &[responder("B2", "Bea")]);
        assert_eq!(roster.responders(Shift::C), &[responder("7", "Cy")]);
        assert!(roster.responders(Shift::D).is_empty());
    }

    #[test]
    fn test_code_ordering() {
        let mut codes = vec!["E1", "12", "B10", "3", "B2", "M1", "b1", "BX"];
        codes.sort_by(|a, b| compare_codes(a, b));
        assert_eq!(codes, vec!["b1", "B2", "B10", "BX", "3", "12", "E1", "M1"]);
    }

    #[test]
    fn test_render_writes_all_sections_sorted() {
        let roster = Roster::parse("[A]\n12,Twelve\nB3,Bee\n3,Three\n");
        assert_eq!(
            roster.render(),
            "[A]\nB3,Bee,,,\n3,Three,,,\n12,Twelve,,,\n\n[B]\n\n[C]\n\n[D]\n\n"
        );
    }

    #[test]
    fn test_add_and_remove() {
        let mut roster = Roster::default();
        roster.add(Shift::A, responder(" 41 ", "Chris")).unwrap();
        assert!(matches!(
            roster.add(Shift::A, responder("41", "Other")),
            Err(ShiftError::DuplicateResponder { .. })
        ));
        roster.add(Shift::B, responder("41", "Other")).unwrap();
        assert!(roster.add(Shift::A, responder("42", "Bad,Name")).is_err());

        let removed = roster.remove(Shift::A, "41").unwrap();
        assert_eq!(removed.name, "Chris");
        assert!(matches!(
            roster.remove(Shift::A, "41"),
            Err(ShiftError::ResponderNotFound { .. })
        ));
        assert_eq!(roster.responders(Shift::B).len(), 1);
    }

    #[test]
    fn test_repository_persists_changes() {
        let dir = TempDir::new().unwrap();
        let repo = RosterRepository::new(dir.path().join("responders.txt"), DEFAULT_LOCK_TIMEOUT);
        assert!(repo.load().unwrap().responders(Shift::A).is_empty());

        repo.add(Shift::C, responder("43", "Kelsey")).unwrap();
        repo.add(Shift::C, responder("B1", "Bill")).unwrap();
        let before = std::fs::read(repo.path()).unwrap();
        assert!(repo.add(Shift::C, responder("43", "Again")).is_err());
        assert_eq!(std::fs::read(repo.path()).unwrap(), before);

        let loaded = repo.load().unwrap();
        let codes: Vec<&str> = loaded.responders(Shift::C).iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["B1", "43"]);

        repo.remove(Shift::C, "B1").unwrap();
        assert_eq!(repo.load().unwrap().responders(Shift::C).len(), 1);
    }

    #[test]
    fn test_save_replaces_whole_file() {
        let dir = TempDir::new().unwrap();
        let repo = RosterRepository::new(dir.path().join("responders.txt"), DEFAULT_LOCK_TIMEOUT);
        std::fs::write(repo.path(), "# hand edited\nSHIFT_D:\n9,Nine\n").unwrap();

        let roster = repo.load().unwrap();
        repo.save(&roster).unwrap();
        assert_eq!(
            std::fs::read_to_string(repo.path()).unwrap(),
            "[A]\n\n[B]\n\n[C]\n\n[D]\n9,Nine,,,\n\n"
        );
    }

    #[test]
    fn test_update_renames_and_moves() {
        let mut roster = Roster::default();
        roster.add(Shift::A, responder("41", "Chris")).unwrap();
        roster.add(Shift::A, responder("42", "Kelsey")).unwrap();
        roster.add(Shift::B, responder("B1", "Bill")).unwrap();

        // same code, same shift: plain edit
        let mut edited = responder("41", "Chris P");
        edited.phone = "555-0141".to_string();
        roster.update(Shift::A, "41", edited, Shift::A).unwrap();
        assert_eq!(roster.responders(Shift::A)[0].phone, "555-0141");

        assert!(matches!(
            roster.update(Shift::A, "41", responder("42", "Chris"), Shift::A),
            Err(ShiftError::DuplicateResponder { .. })
        ));
        assert!(matches!(
            roster.update(Shift::A, "42", responder("B1", "Kelsey"), Shift::B),
            Err(ShiftError::DuplicateResponder { .. })
        ));
        assert!(matches!(
            roster.update(Shift::C, "42", responder("42", "Kelsey"), Shift::C),
            Err(ShiftError::ResponderNotFound { .. })
        ));
        assert_eq!(roster.responders(Shift::A).len(), 2);

        let previous = roster.update(Shift::A, "42", responder("B7", "Kelsey"), Shift::B).unwrap();
        assert_eq!(previous.code, "42");
        let codes: Vec<&str> = roster.responders(Shift::B).iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["B1", "B7"]);
        assert_eq!(roster.responders(Shift::A).len(), 1);
    }

    #[test]
    fn test_repository_update_persists() {
        let dir = TempDir::new().unwrap();
        let repo = RosterRepository::new(dir.path().join("responders.txt"), DEFAULT_LOCK_TIMEOUT);
        repo.add(Shift::D, responder("9", "Nine")).unwrap();

        repo.update(Shift::D, "9", responder("10", "Ten"), Shift::A).unwrap();
        assert_eq!(
            std::fs::read_to_string(repo.path()).unwrap(),
            "[A]\n10,Ten,,,\n\n[B]\n\n[C]\n\n[D]\n\n"
        );
    }
}
