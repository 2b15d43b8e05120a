use focusarena_core::{Database, FocusMode, OutcomeStatus};

use super::{print_json, CommandResult};

/// Most recent sessions first, optionally narrowed to one mode or status.
/// Filters apply within the last `limit` sessions.
pub fn run(limit: usize, mode: Option<&str>, status: Option<&str>) -> CommandResult {
    let mode = mode.map(str::parse::<FocusMode>).transpose()?;
    let status = status
        .map(|s| OutcomeStatus::parse(s).ok_or_else(|| format!("unknown status: {s}")))
        .transpose()?;

    let db = Database::open()?;
    let records: Vec<_> = db
        .recent_sessions(limit)?
        .into_iter()
        .filter(|record| record.matches(mode, status))
        .collect();
    print_json(&records)
}
