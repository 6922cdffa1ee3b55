//! Free-text search over loaded runs

use crate::models::RunRecord;

/// Whether any field, status entry or addendum contains `query`, ignoring case
pub fn matches(run: &RunRecord, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    let fields = [
        &run.run_number,
        &run.caller,
        &run.location,
        &run.nature,
        &run.assigned,
        &run.notes,
    ];
    let contains = |text: &str| text.to_lowercase().contains(&needle);

    fields.into_iter().any(|field| contains(field))
        || run.statuses.iter().any(|status| {
            contains(&status.unit) || contains(&status.status) || contains(&status.timestamp)
        })
        || run.addendums.iter().any(|addendum| contains(addendum))
}

/// Runs matching `query`, in their original order
pub fn search<'a, I>(runs: I, query: &str) -> Vec<&'a RunRecord>
where
    I: IntoIterator<Item = &'a RunRecord>,
{
    runs.into_iter().filter(|run| matches(run, query)).collect()
}
