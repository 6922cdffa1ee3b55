//! Run model

use auth::Assignment;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of a unit's status history, `UNIT|STATUS|TIMESTAMP` on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub unit: String,
    pub status: String,
    pub timestamp: String,
}

impl UnitStatus {
    pub fn new(unit: impl Into<String>, status: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            status: status.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Run submitted from the call-entry form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRun {
    pub run_number: String,
    pub caller: String,
    pub location: String,
    pub nature: String,
    /// Comma-separated responder and apparatus codes
    pub assigned: String,
    pub notes: String,
    /// Defaults to the submission time
    pub timestamp: Option<String>,
    pub statuses: Vec<UnitStatus>,
}

/// Run as stored in the log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_number: String,
    pub caller: String,
    pub location: String,
    pub nature: String,
    pub assigned: String,
    pub timestamp: String,
    pub notes: String,
    pub statuses: Vec<UnitStatus>,
    pub addendums: Vec<String>,
}

/// Assigned codes split on commas or semicolons
pub fn split_assigned(assigned: &str) -> Vec<String> {
    assigned
        .split([',', ';'])
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

impl RunRecord {
    pub fn assigned_list(&self) -> Vec<String> {
        split_assigned(&self.assigned)
    }
}

impl Assignment for RunRecord {
    fn assigned_units(&self) -> Vec<String> {
        self.assigned_list()
    }

    /// Units that logged a status on this run
    fn assigned_responders(&self) -> Vec<String> {
        let mut units: Vec<String> = Vec::new();
        for status in &self.statuses {
            let unit = status.unit.trim();
            if !unit.is_empty() && !units.iter().any(|known| known == unit) {
                units.push(unit.to_string());
            }
        }
        units
    }
}

impl fmt::Display for RunRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run Number: {}", self.run_number)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Caller: {}", self.caller)?;
        writeln!(f, "Location: {}", self.location)?;
        writeln!(f, "Nature: {}", self.nature)?;
        writeln!(f, "Assigned: {}", self.assigned)?;
        writeln!(f)?;
        writeln!(f, "Notes:")?;
        writeln!(f, "{}", self.notes.trim())?;
        writeln!(f)?;
        writeln!(f, "Statuses:")?;
        for status in &self.statuses {
            writeln!(f, "  {}: {} at {}", status.unit, status.status, status.timestamp)?;
        }
        writeln!(f)?;
        writeln!(f, "Addendums:")?;
        if self.addendums.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for addendum in &self.addendums {
            writeln!(f, "  {}", addendum)?;
        }
        Ok(())
    }
}
