//! Per-tree-level filtering for the tree checksum engine.
//!
//! While the walker descends through tree objects, the include/exclude globs
//! are re-expressed relative to the current tree: patterns that name the
//! entered directory lose their first segment, `**`-led patterns stay active
//! unchanged, and patterns that point elsewhere drop out. The shifted state
//! lives only for the duration of one descent and is restored on every exit
//! path.

use std::collections::HashSet;
use std::mem;

use crate::error::DigestError;
use crate::filter::{format_glob, format_globs, match_segment, GlobPattern, PathFilter};

/// Verdict for one directory or submodule entry.
///
/// `is_valid` admits the entry (possibly as a whole subtree); `should_descend`
/// forces the walker inside because deeper filters still apply. An admitted
/// entry without descent collapses to its single directory-object hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryCheck {
    pub is_valid: bool,
    pub should_descend: bool,
}

/// Path filter with per-recursion-level glob state for tree walking.
pub struct TreeFilter {
    path_filter: PathFilter,
    include_rel: Vec<GlobPattern>,
    exclude_rel: Vec<GlobPattern>,
    path_patterns: Vec<String>,
    matched_origins: HashSet<usize>,
}

impl TreeFilter {
    /// Builds the filter for one walk. Caller-supplied `path_patterns` are
    /// merged into the include set and tracked individually so patterns that
    /// never admit anything can be reported afterwards.
    pub fn new(
        base_path: &str,
        include_globs: &[String],
        exclude_globs: &[String],
        path_patterns: &[String],
    ) -> Result<Self, DigestError> {
        let mut matched_origins = HashSet::new();

        let mut include: Vec<GlobPattern> = format_globs(include_globs)
            .into_iter()
            .map(|pattern| GlobPattern { pattern, origin: None })
            .collect();
        for (origin, pattern) in path_patterns.iter().enumerate() {
            match format_glob(pattern) {
                Some(pattern) => include.push(GlobPattern { pattern, origin: Some(origin) }),
                // A pattern that reduces to nothing selects the whole tree;
                // it can never be a no-match.
                None => {
                    matched_origins.insert(origin);
                }
            }
        }

        let exclude: Vec<GlobPattern> = format_globs(exclude_globs)
            .into_iter()
            .map(|pattern| GlobPattern { pattern, origin: None })
            .collect();

        let path_filter = PathFilter::with_patterns(base_path, &include, &exclude)?;

        Ok(TreeFilter {
            path_filter,
            include_rel: include,
            exclude_rel: exclude,
            path_patterns: path_patterns.to_vec(),
            matched_origins,
        })
    }

    pub fn base_path(&self) -> &str {
        self.path_filter.base_path()
    }

    /// True when no glob reaches into the tree at all; the whole selection
    /// then reduces to the commit hash itself.
    pub fn should_not_walk_through_tree(&self) -> bool {
        self.include_rel.is_empty() && self.exclude_rel.is_empty()
    }

    /// Decides admission and descent for one entry of the current tree.
    ///
    /// An empty include set admits every entry; excludes are then applied on
    /// top. A multi-segment include or exclude matching the entry forces
    /// descent, because only deeper levels can settle the decision.
    pub fn check_entry(&self, entry_name: &str) -> Result<EntryCheck, DigestError> {
        let mut is_valid = self.include_rel.is_empty();
        let mut should_descend = false;

        for glob in &self.include_rel {
            let parts: Vec<&str> = glob.pattern.split('/').collect();
            if match_segment(parts[0], entry_name)? {
                is_valid = true;
                if parts.len() > 1 {
                    should_descend = true;
                    break;
                }
            }
        }

        for glob in &self.exclude_rel {
            let parts: Vec<&str> = glob.pattern.split('/').collect();
            if match_segment(parts[0], entry_name)? {
                if parts.len() > 1 {
                    // The exclude only applies deeper; the entry stays
                    // admitted but must be walked.
                    is_valid = true;
                    should_descend = true;
                } else {
                    is_valid = false;
                    should_descend = false;
                    break;
                }
            }
        }

        Ok(EntryCheck { is_valid, should_descend })
    }

    /// Full-path check for blob entries, recording which caller-supplied
    /// patterns admitted the file.
    pub fn is_file_path_valid(&mut self, path: &str) -> bool {
        match self.path_filter.file_path_match(path) {
            Some(origins) => {
                self.matched_origins.extend(origins);
                true
            }
            None => false,
        }
    }

    /// Records caller-supplied patterns satisfied by a subtree that is being
    /// collapsed into a single directory-object hash.
    pub fn note_collapsed_entry(&mut self, entry_name: &str) -> Result<(), DigestError> {
        for glob in &self.include_rel {
            if let Some(origin) = glob.origin {
                let first = glob.pattern.split('/').next().unwrap_or_default();
                if match_segment(first, entry_name)? {
                    self.matched_origins.insert(origin);
                }
            }
        }
        Ok(())
    }

    /// Caller-supplied patterns that admitted nothing during the walk.
    pub fn no_match_paths(&self) -> Vec<String> {
        self.path_patterns
            .iter()
            .enumerate()
            .filter(|(origin, _)| !self.matched_origins.contains(origin))
            .map(|(_, pattern)| pattern.clone())
            .collect()
    }

    /// Runs `body` with both glob sets shifted past `entry_name`, restoring
    /// the previous sets on every exit path, including failure. This is the
    /// only place filter state changes.
    pub fn without_entry_in_paths<T>(
        &mut self,
        entry_name: &str,
        body: impl FnOnce(&mut Self) -> Result<T, DigestError>,
    ) -> Result<T, DigestError> {
        let shifted_include = shift_globs(entry_name, &self.include_rel)?;
        let shifted_exclude = shift_globs(entry_name, &self.exclude_rel)?;

        let saved_include = mem::replace(&mut self.include_rel, shifted_include);
        let saved_exclude = mem::replace(&mut self.exclude_rel, shifted_exclude);

        let result = body(self);

        self.include_rel = saved_include;
        self.exclude_rel = saved_exclude;

        result
    }
}

/// Re-expresses globs relative to the inside of `entry_name`.
///
/// Patterns whose first segment does not match are dropped; a matching first
/// segment containing `**` keeps the whole pattern active; a matching
/// multi-segment pattern loses its first segment; a matching single-segment
/// pattern is consumed entirely.
pub(crate) fn shift_globs(
    entry_name: &str,
    globs: &[GlobPattern],
) -> Result<Vec<GlobPattern>, DigestError> {
    let mut shifted = Vec::new();

    for glob in globs {
        let parts: Vec<&str> = glob.pattern.split('/').collect();

        if !match_segment(parts[0], entry_name)? {
            continue;
        }

        if parts[0].contains("**") {
            shifted.push(glob.clone());
        } else if parts.len() > 1 {
            shifted.push(GlobPattern { pattern: parts[1..].join("/"), origin: glob.origin });
        }
    }

    Ok(shifted)
}
