use std::path::Path;

use merit_common::error::{MeritError, MeritResult};

use crate::sources::Target;

/// Load the target repository list from the enumeration file.
///
/// One `host/owner/repo` identifier per line; blank lines and `#` comments
/// are ignored. An unreadable or empty list is a startup error — there is
/// nothing to ingest without it.
pub fn load_targets(path: &Path) -> MeritResult<Vec<Target>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        MeritError::Config(format!(
            "failed to read repositories file {}: {e}",
            path.display()
        ))
    })?;

    let targets = parse_targets(&raw);
    if targets.is_empty() {
        return Err(MeritError::Config(format!(
            "repositories file {} contains no repositories",
            path.display()
        )));
    }

    Ok(targets)
}

pub fn parse_targets(raw: &str) -> Vec<Target> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Target::from_line)
        .collect()
}
