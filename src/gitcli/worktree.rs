//! Scoped worktree materialization.
//!
//! A commit is checked out as a detached linked worktree under the shared
//! cache directory, keyed by commit id so later invocations for the same
//! commit reuse it. The checkout is removed again if materialization fails
//! partway through.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::DigestError;
use crate::gitcli::git_output;

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkTreeOptions {
    pub has_submodules: bool,
}

/// Prepares a worktree for `commit` and hands its directory to `body`.
///
/// On entry the directory contains the commit's tree, with submodules
/// checked out iff `has_submodules`. Failures in `body` surface unchanged.
pub fn with_work_tree<T>(
    git_dir: &Path,
    work_tree_cache_dir: &Path,
    commit: &str,
    options: &WorkTreeOptions,
    body: impl FnOnce(&Path) -> Result<T, DigestError>,
) -> Result<T, DigestError> {
    let work_tree_dir = work_tree_cache_dir.join(commit);
    prepare_work_tree(git_dir, &work_tree_dir, commit, options)?;
    body(&work_tree_dir)
}

fn prepare_work_tree(
    git_dir: &Path,
    work_tree_dir: &Path,
    commit: &str,
    options: &WorkTreeOptions,
) -> Result<(), DigestError> {
    let git_dir_arg = git_dir.to_string_lossy().into_owned();
    let work_tree_arg = work_tree_dir.to_string_lossy().into_owned();

    if work_tree_dir.exists() {
        if current_commit(work_tree_dir).as_deref() == Some(commit) {
            debug!(dir = %work_tree_dir.display(), "reusing cached worktree");
            return Ok(());
        }
        // A directory keyed by another commit (or broken beyond rev-parse)
        // cannot be trusted.
        remove_work_tree(&git_dir_arg, work_tree_dir);
    }

    if let Some(parent) = work_tree_dir.parent() {
        fs::create_dir_all(parent).map_err(|e| DigestError::io(parent, e))?;
    }

    // Drop registrations whose directories are gone, then check out.
    let _ = git_output(&[format!("--git-dir={git_dir_arg}"), "worktree".into(), "prune".into()], None);

    debug!(dir = %work_tree_dir.display(), commit, "materializing worktree");

    let mut checkout = PartialCheckout { git_dir_arg: &git_dir_arg, work_tree_dir, armed: true };

    git_output(
        &[
            format!("--git-dir={git_dir_arg}"),
            "worktree".into(),
            "add".into(),
            "--force".into(),
            "--detach".into(),
            work_tree_arg,
            commit.into(),
        ],
        None,
    )?;

    if options.has_submodules {
        git_output(
            &["submodule".into(), "update".into(), "--init".into(), "--recursive".into()],
            Some(work_tree_dir),
        )?;
    }

    checkout.armed = false;
    Ok(())
}

fn current_commit(work_tree_dir: &Path) -> Option<String> {
    git_output(&["rev-parse".into(), "HEAD".into()], Some(work_tree_dir))
        .ok()
        .map(|out| String::from_utf8_lossy(&out).trim().to_string())
}

fn remove_work_tree(git_dir_arg: &str, work_tree_dir: &Path) {
    let _ = git_output(
        &[
            format!("--git-dir={git_dir_arg}"),
            "worktree".into(),
            "remove".into(),
            "--force".into(),
            work_tree_dir.to_string_lossy().into_owned(),
        ],
        None,
    );
    let _ = fs::remove_dir_all(work_tree_dir);
    let _ = git_output(&[format!("--git-dir={git_dir_arg}"), "worktree".into(), "prune".into()], None);
}

/// Reclaims a half-materialized checkout if preparation bails out early.
struct PartialCheckout<'a> {
    git_dir_arg: &'a str,
    work_tree_dir: &'a Path,
    armed: bool,
}

impl Drop for PartialCheckout<'_> {
    fn drop(&mut self) {
        if self.armed {
            remove_work_tree(self.git_dir_arg, self.work_tree_dir);
        }
    }
}
