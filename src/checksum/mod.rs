//! Deterministic checksums of a filtered repository snapshot.
//!
//! Two interoperating strategies produce a digest for
//! `(commit, basePath, includeGlobs, excludeGlobs, paths)`:
//!
//! - [`worktree::worktree_checksum`] materializes the commit and streams file
//!   content, modes and symlink targets through the hash.
//! - [`tree::tree_checksum`] walks tree objects directly, collapsing whole
//!   subtrees into their directory-object hash wherever no filter reaches
//!   inside.
//!
//! Both are pure functions of the repository state at the commit; a given
//! input always yields the same digest on any machine.

use serde::Serialize;

pub mod tree;
pub mod worktree;

pub use tree::tree_checksum;
pub use worktree::worktree_checksum;

/// Input selection for one checksum computation.
#[derive(Debug, Clone, Default)]
pub struct ChecksumOptions {
    /// Full 40-hex commit id to snapshot.
    pub commit: String,
    /// Optional path prefix restricting traversal to one subtree.
    pub base_path: String,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    /// Caller-supplied path patterns; those matching nothing are reported in
    /// [`Checksum::no_match_paths`].
    pub paths: Vec<String>,
}

/// Final digest plus the path patterns that selected nothing.
#[derive(Debug, Clone, Serialize)]
pub struct Checksum {
    pub digest: String,
    pub no_match_paths: Vec<String>,
}
