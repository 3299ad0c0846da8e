//! Shared CLI utilities.

use std::env;
use std::path::{Path, PathBuf};

/// Flattens repeated CLI values where each value may itself be
/// comma-separated, trimming whitespace and discarding empty segments.
pub fn parse_globs(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}

/// Worktree cache location when neither flag nor config names one.
pub fn default_worktree_cache_dir() -> PathBuf {
    env::temp_dir().join("repo-digest").join("worktrees")
}

/// Repository display name: the directory name of its root.
pub fn repo_name(root: &Path) -> String {
    root.file_name().and_then(|n| n.to_str()).unwrap_or("repo").to_string()
}
