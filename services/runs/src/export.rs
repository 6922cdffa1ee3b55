//! CSV export of a single run

use common::{StoreError, fs};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::RunResult;
use crate::models::RunRecord;

/// File name used when exporting `run_number`
///
/// Anything outside letters, digits, `-`, `_` and inner dots becomes `_`, so
/// the name never leaves the export directory.
pub fn export_file_name(run_number: &str) -> String {
    let stem: String = run_number
        .trim()
        .chars()
        .enumerate()
        .map(|(index, c)| match c {
            c if c.is_alphanumeric() || c == '-' || c == '_' => c,
            '.' if index > 0 => c,
            _ => '_',
        })
        .collect();
    format!("{stem}.csv")
}

/// Write the run as `Field,Value` rows, then notes, statuses and addendums
pub fn write_csv<W: Write>(run: &RunRecord, writer: W) -> RunResult<()> {
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    csv_writer.write_record(["Field", "Value"]).map_err(StoreError::from)?;
    let fields = [
        ("Run Number", &run.run_number),
        ("Timestamp", &run.timestamp),
        ("Caller", &run.caller),
        ("Location", &run.location),
        ("Nature", &run.nature),
        ("Assigned", &run.assigned),
    ];
    for (label, value) in fields {
        csv_writer.write_record([label, value.as_str()]).map_err(StoreError::from)?;
    }

    csv_writer.write_record(None::<&str>).map_err(StoreError::from)?;
    csv_writer.write_record(["Notes"]).map_err(StoreError::from)?;
    csv_writer.write_record([run.notes.trim()]).map_err(StoreError::from)?;

    if !run.statuses.is_empty() {
        csv_writer.write_record(None::<&str>).map_err(StoreError::from)?;
        csv_writer
            .write_record(["Unit", "Status", "Timestamp"])
            .map_err(StoreError::from)?;
        for status in &run.statuses {
            csv_writer
                .write_record([&status.unit, &status.status, &status.timestamp])
                .map_err(StoreError::from)?;
        }
    }

    if !run.addendums.is_empty() {
        csv_writer.write_record(None::<&str>).map_err(StoreError::from)?;
        csv_writer.write_record(["Addendums"]).map_err(StoreError::from)?;
        for addendum in &run.addendums {
            csv_writer.write_record([addendum]).map_err(StoreError::from)?;
        }
    }

    csv_writer
        .flush()
        .map_err(|e| StoreError::io(Path::new("<csv>"), e))?;
    Ok(())
}

/// Export `run` into `dir`, returning the written path
pub fn export_to_dir(run: &RunRecord, dir: &Path) -> RunResult<PathBuf> {
    let path = dir.join(export_file_name(&run.run_number));
    fs::ensure_parent(&path)?;

    let mut buffer = Vec::new();
    write_csv(run, &mut buffer)?;
    std::fs::write(&path, buffer).map_err(|e| StoreError::io(&path, e))?;

    info!("Exported run {} to {}", run.run_number, path.display());
    Ok(path)
}
