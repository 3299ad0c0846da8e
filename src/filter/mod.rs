//! Path filtering for checksum traversals.
//!
//! A [`PathFilter`] decides whether a repo-relative file path is part of the
//! selection: the path must live under the base path (when one is set), match
//! at least one include glob (or the include set is empty) and match no
//! exclude glob. Globs use doublestar semantics: `**` matches any number of
//! path components, `*` never crosses a separator.

use globset::{GlobBuilder, GlobMatcher};

use crate::error::DigestError;

pub mod tree;

pub use tree::TreeFilter;

/// One include/exclude glob, compiled for full-path matching.
///
/// `origin` ties the glob back to the caller-supplied path pattern it came
/// from (if any) so the tree walker can report patterns that never matched.
#[derive(Debug, Clone)]
pub(crate) struct GlobPattern {
    pub pattern: String,
    pub origin: Option<usize>,
}

#[derive(Debug)]
struct CompiledPattern {
    origin: Option<usize>,
    /// Matches the pattern itself.
    exact: GlobMatcher,
    /// Matches anything below a directory the pattern names (`<pattern>/**`).
    deep: GlobMatcher,
}

impl CompiledPattern {
    fn new(glob: &GlobPattern) -> Result<Self, DigestError> {
        Ok(CompiledPattern {
            origin: glob.origin,
            exact: compile_glob(&glob.pattern)?,
            deep: compile_glob(&format!("{}/**", glob.pattern))?,
        })
    }

    fn matches(&self, rel_path: &str) -> bool {
        self.exact.is_match(rel_path) || self.deep.is_match(rel_path)
    }
}

/// Immutable path filter shared by both checksum engines.
#[derive(Debug)]
pub struct PathFilter {
    base_path: String,
    include: Vec<CompiledPattern>,
    exclude: Vec<CompiledPattern>,
}

impl PathFilter {
    pub fn new(
        base_path: &str,
        include_globs: &[String],
        exclude_globs: &[String],
    ) -> Result<Self, DigestError> {
        let include: Vec<GlobPattern> = format_globs(include_globs)
            .into_iter()
            .map(|pattern| GlobPattern { pattern, origin: None })
            .collect();
        let exclude: Vec<GlobPattern> = format_globs(exclude_globs)
            .into_iter()
            .map(|pattern| GlobPattern { pattern, origin: None })
            .collect();
        PathFilter::with_patterns(base_path, &include, &exclude)
    }

    /// Constructor for pre-formatted patterns carrying origin indices.
    pub(crate) fn with_patterns(
        base_path: &str,
        include_globs: &[GlobPattern],
        exclude_globs: &[GlobPattern],
    ) -> Result<Self, DigestError> {
        let include = include_globs.iter().map(CompiledPattern::new).collect::<Result<_, _>>()?;
        let exclude = exclude_globs.iter().map(CompiledPattern::new).collect::<Result<_, _>>()?;

        Ok(PathFilter { base_path: normalize_glob(base_path), include, exclude })
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Whether a repo-relative file path belongs to the selection.
    pub fn is_file_path_valid(&self, path: &str) -> bool {
        self.file_path_match(path).is_some()
    }

    /// Full filter check that also reports which include patterns matched.
    ///
    /// Returns `None` when the path is rejected, otherwise the origin indices
    /// of every caller-supplied pattern that admitted it.
    pub(crate) fn file_path_match(&self, path: &str) -> Option<Vec<usize>> {
        let rel = self.trim_base_path(path)?;

        if self.exclude.iter().any(|p| p.matches(rel)) {
            return None;
        }

        if self.include.is_empty() {
            return Some(Vec::new());
        }

        let mut matched = false;
        let mut origins = Vec::new();
        for pattern in &self.include {
            if pattern.matches(rel) {
                matched = true;
                if let Some(origin) = pattern.origin {
                    origins.push(origin);
                }
            }
        }

        matched.then_some(origins)
    }

    /// Strips the base path prefix; `None` when the path lives outside it.
    fn trim_base_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.base_path.is_empty() {
            return Some(path);
        }
        let rest = path.strip_prefix(&self.base_path)?;
        if rest.is_empty() {
            Some("")
        } else {
            rest.strip_prefix('/')
        }
    }
}

/// Compiles a glob with doublestar semantics (`*` stops at separators).
pub(crate) fn compile_glob(pattern: &str) -> Result<GlobMatcher, DigestError> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| DigestError::glob(pattern, e))?
        .compile_matcher())
}

/// Matches one path component against one glob segment.
pub(crate) fn match_segment(pattern: &str, name: &str) -> Result<bool, DigestError> {
    Ok(compile_glob(pattern)?.is_match(name))
}

/// Converts separators to `/` and drops any trailing separator.
pub(crate) fn normalize_glob(glob: &str) -> String {
    glob.replace('\\', "/").trim_end_matches('/').to_string()
}

/// Normalizes globs for segment-by-segment entry checks.
///
/// Trailing `/**/*`, `/**` and `/*` suffixes are stripped repeatedly, so a
/// pattern like `src/**` is equivalent to `src`. Globs that reduce to nothing
/// are dropped.
pub(crate) fn format_globs(globs: &[String]) -> Vec<String> {
    globs.iter().filter_map(|g| format_glob(g)).collect()
}

pub(crate) fn format_glob(glob: &str) -> Option<String> {
    let mut result = normalize_glob(glob);
    loop {
        let before = result.len();
        for suffix in ["/**/*", "/**", "/*"] {
            while let Some(stripped) = result.strip_suffix(suffix) {
                result.truncate(stripped.len());
            }
        }
        if result.len() == before {
            break;
        }
    }

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globs(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn format_globs_strips_universal_suffixes() {
        assert_eq!(
            format_globs(&globs(&["src/**", "src/**/*", "src/*", "docs"])),
            vec!["src", "src", "src", "docs"],
        );
    }

    #[test]
    fn format_globs_strips_stacked_suffixes() {
        assert_eq!(format_glob("src/**/**"), Some("src".to_string()));
        assert_eq!(format_glob("src/**/*/**"), Some("src".to_string()));
    }

    #[test]
    fn format_globs_drops_empty_results() {
        assert_eq!(format_globs(&globs(&["**", "**/*", "*"])), Vec::<String>::new());
    }

    #[test]
    fn empty_filter_admits_everything() {
        let filter = PathFilter::new("", &[], &[]).expect("filter");
        assert!(filter.is_file_path_valid("README.md"));
        assert!(filter.is_file_path_valid("src/deep/nested/a.c"));
    }

    #[test]
    fn include_pattern_admits_files_below_named_directory() {
        let filter = PathFilter::new("", &globs(&["src/**"]), &[]).expect("filter");
        assert!(filter.is_file_path_valid("src/a.c"));
        assert!(filter.is_file_path_valid("src/deep/b.c"));
        assert!(!filter.is_file_path_valid("docs/x.md"));
    }

    #[test]
    fn exclude_pattern_rejects_whole_subtree() {
        let filter = PathFilter::new("", &[], &globs(&["docs"])).expect("filter");
        assert!(filter.is_file_path_valid("src/a.c"));
        assert!(!filter.is_file_path_valid("docs/x.md"));
        assert!(!filter.is_file_path_valid("docs"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter =
            PathFilter::new("", &globs(&["src"]), &globs(&["src/generated"])).expect("filter");
        assert!(filter.is_file_path_valid("src/a.c"));
        assert!(!filter.is_file_path_valid("src/generated/a.c"));
    }

    #[test]
    fn base_path_restricts_and_relativizes() {
        let filter = PathFilter::new("vendor/lib", &globs(&["src"]), &[]).expect("filter");
        assert!(filter.is_file_path_valid("vendor/lib/src/a.c"));
        assert!(!filter.is_file_path_valid("vendor/lib/docs/x.md"));
        assert!(!filter.is_file_path_valid("other/src/a.c"));
    }

    #[test]
    fn single_star_does_not_cross_separators() {
        let filter = PathFilter::new("", &globs(&["src/*.c"]), &[]).expect("filter");
        assert!(filter.is_file_path_valid("src/a.c"));
        assert!(!filter.is_file_path_valid("src/deep/a.c"));
    }

    #[test]
    fn malformed_glob_is_an_error_not_a_panic() {
        let err = PathFilter::new("", &globs(&["src/["]), &[]).unwrap_err();
        assert!(matches!(err, DigestError::Glob { .. }));
    }
}
