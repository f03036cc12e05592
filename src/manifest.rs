use std::fs;
use std::path::Path;

use crate::prelude::*;

/// One raw line of the launch manifest, split on the first two commas.
/// No validation happens here; the launcher rejects entries it cannot use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// 1-based source line, for diagnostics.
    pub line: usize,
    pub group: String,
    pub command: String,
    /// Verbatim remainder after the second comma, commas included.
    pub args: String,
}

pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    Ok(parse_manifest(&content))
}

/// Split manifest lines into `(group, command, args)` entries.
///
/// Blank lines are skipped. A line without any comma has no command field;
/// it is still handed over so the launcher can report it against its line
/// number.
pub fn parse_manifest(content: &str) -> Vec<ManifestEntry> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = idx + 1;
            if raw.trim().is_empty() {
                return None;
            }

            let (group, rest) = match raw.split_once(',') {
                Some((group, rest)) => (group, Some(rest)),
                None => (raw, None),
            };
            let (command, args) = match rest {
                Some(rest) => rest.split_once(',').unwrap_or((rest, "")),
                None => ("", ""),
            };

            Some(ManifestEntry {
                line,
                group: group.to_owned(),
                command: command.to_owned(),
                args: args.to_owned(),
            })
        })
        .collect()
}
