//! Input pattern resolution.
//!
//! `global.input_files` is a comma-separated list of glob patterns. Each
//! sub-pattern expands to a lexicographically sorted group; groups are
//! concatenated in pattern order (no global re-sort, so the user's grouping
//! survives), and duplicates keep their first occurrence.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Expand a comma-separated pattern string into a concrete file list.
///
/// Paths are canonicalized to absolute form where possible. Fails with
/// [`PipelineError::Config`] on malformed glob syntax and
/// [`PipelineError::NoFilesFound`] when nothing matches at all.
pub fn resolve_patterns(patterns: &str) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for sub in patterns.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let matches = glob::glob(sub).map_err(|e| {
            PipelineError::Config(format!("bad glob pattern '{sub}': {e}"))
        })?;
        let mut group: Vec<PathBuf> = matches
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .map(|p| p.canonicalize().unwrap_or(p))
            .collect();
        group.sort();
        for path in group {
            if seen.insert(path.clone()) {
                out.push(path);
            }
        }
    }

    if out.is_empty() {
        return Err(PipelineError::NoFilesFound { patterns: patterns.to_string() });
    }
    Ok(out)
}
