//! Text block format of the run log
//!
//! ```text
//! === RUN START ===
//! RunNumber: 2025-014
//! Caller: Main security
//! Location: Cell assembly
//! Nature: Fall
//! Assigned: 41, 42, M1
//! Timestamp: 2025-03-02 14:05:11
//! Notes:
//! Call Received
//! Statuses:
//! 41|ON SCENE|2025-03-02 14:09:40
//! Addendums:
//! [2025-03-02 16:00:00] alex: patient released
//! === RUN END ===
//! ```
//!
//! Header labels are only recognised before `Notes:`, so note lines such as
//! `Caller: updated` stay part of the notes.

use crate::error::{RunError, RunResult};
use crate::models::{RunRecord, UnitStatus};
use tracing::debug;

pub const RUN_START: &str = "=== RUN START ===";
pub const RUN_END: &str = "=== RUN END ===";
const NOTES: &str = "Notes:";
const STATUSES: &str = "Statuses:";
const ADDENDUMS: &str = "Addendums:";

const RESERVED_LINES: [&str; 5] = [RUN_START, RUN_END, NOTES, STATUSES, ADDENDUMS];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Notes,
    Statuses,
    Addendums,
}

/// Render one run as a block followed by a blank separator line
pub fn encode(run: &RunRecord) -> String {
    let mut out = String::new();
    let mut line = |text: &str| {
        out.push_str(text);
        out.push('\n');
    };

    line(RUN_START);
    line(&format!("RunNumber: {}", run.run_number));
    line(&format!("Caller: {}", run.caller));
    line(&format!("Location: {}", run.location));
    line(&format!("Nature: {}", run.nature));
    line(&format!("Assigned: {}", run.assigned));
    line(&format!("Timestamp: {}", run.timestamp));
    line(NOTES);
    line(run.notes.trim_end_matches('\n'));
    line(STATUSES);
    for status in &run.statuses {
        line(&format!("{}|{}|{}", status.unit, status.status, status.timestamp));
    }
    line(ADDENDUMS);
    for addendum in &run.addendums {
        line(addendum);
    }
    line(RUN_END);
    line("");
    out
}

/// Render a whole log
pub fn encode_all(runs: &[RunRecord]) -> String {
    runs.iter().map(encode).collect()
}

/// Parse every complete block; text outside blocks and unterminated blocks
/// are ignored
pub fn parse(contents: &str) -> Vec<RunRecord> {
    let mut runs = Vec::new();
    let mut current: Option<RunRecord> = None;
    let mut section = Section::Header;

    for raw in contents.lines() {
        let line = raw.trim_end_matches('\r');

        if line == RUN_START {
            if current.is_some() {
                debug!("Discarding unterminated run block");
            }
            current = Some(RunRecord::default());
            section = Section::Header;
            continue;
        }
        if line == RUN_END {
            if let Some(mut run) = current.take() {
                run.notes = run.notes.trim_end_matches('\n').to_string();
                runs.push(run);
            }
            section = Section::Header;
            continue;
        }
        let Some(run) = current.as_mut() else {
            continue;
        };

        match line {
            NOTES => section = Section::Notes,
            STATUSES => section = Section::Statuses,
            ADDENDUMS => section = Section::Addendums,
            _ => match section {
                Section::Header => parse_header(run, line),
                Section::Notes => {
                    run.notes.push_str(line);
                    run.notes.push('\n');
                }
                Section::Statuses => {
                    let parts: Vec<&str> = line.split('|').collect();
                    if parts.len() >= 3 {
                        run.statuses.push(UnitStatus::new(parts[0], parts[1], parts[2]));
                    } else if !line.trim().is_empty() {
                        debug!("Skipping malformed status line in run {}", run.run_number);
                    }
                }
                Section::Addendums => {
                    if !line.trim().is_empty() {
                        run.addendums.push(line.to_string());
                    }
                }
            },
        }
    }

    runs
}

fn parse_header(run: &mut RunRecord, line: &str) {
    let Some((label, value)) = line.split_once(": ") else {
        return;
    };
    let field = match label {
        "RunNumber" => &mut run.run_number,
        "Caller" => &mut run.caller,
        "Location" => &mut run.location,
        "Nature" => &mut run.nature,
        "Assigned" => &mut run.assigned,
        "Timestamp" => &mut run.timestamp,
        _ => return,
    };
    *field = value.to_string();
}

/// Reject values that would break the block structure
pub fn validate(run: &RunRecord) -> RunResult<()> {
    if run.run_number.trim().is_empty() {
        return Err(RunError::InvalidInput("run number is required".to_string()));
    }
    if run.run_number.contains(['/', '\\']) {
        return Err(RunError::InvalidInput(
            "run number cannot contain path separators".to_string(),
        ));
    }

    let single_line = [
        ("run number", &run.run_number),
        ("caller", &run.caller),
        ("location", &run.location),
        ("nature", &run.nature),
        ("assigned", &run.assigned),
        ("timestamp", &run.timestamp),
    ];
    for (label, value) in single_line {
        if value.contains(['\n', '\r']) {
            return Err(RunError::InvalidInput(format!("{label} must be a single line")));
        }
    }

    if let Some(line) = run
        .notes
        .lines()
        .find(|line| RESERVED_LINES.contains(&line.trim_end_matches('\r')))
    {
        return Err(RunError::InvalidInput(format!(
            "notes cannot contain the line '{line}'"
        )));
    }

    for status in &run.statuses {
        for value in [&status.unit, &status.status, &status.timestamp] {
            if value.contains(['|', '\n', '\r']) {
                return Err(RunError::InvalidInput(format!(
                    "status entry for {} cannot contain '|' or a line break",
                    status.unit
                )));
            }
        }
    }

    for addendum in &run.addendums {
        if addendum.contains(['\n', '\r']) || RESERVED_LINES.contains(&addendum.as_str()) {
            return Err(RunError::InvalidInput(
                "addendum must be a single ordinary line".to_string(),
            ));
        }
    }

    Ok(())
}
