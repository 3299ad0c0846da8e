//! Patch extraction between two commits.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DigestError;
use crate::gitcli::{filter_pathspecs, git_output, with_work_tree, WorkTreeOptions};

#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    pub from_commit: String,
    pub to_commit: String,
    pub base_path: String,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    /// Emit whole-function hunk context (`git diff -W`).
    pub with_entire_file_context: bool,
    /// Emit binary deltas instead of placeholders.
    pub with_binary: bool,
}

/// Where a produced patch lives; callers treat the contents as opaque.
#[derive(Debug, Clone)]
pub struct PatchDescriptor {
    pub from_commit: String,
    pub to_commit: String,
    pub file_path: PathBuf,
}

/// Writes the patch for a submodule-free commit range straight off the
/// object store.
pub fn create_patch(
    out_path: &Path,
    git_dir: &Path,
    opts: &PatchOptions,
) -> Result<PatchDescriptor, DigestError> {
    write_patch(out_path, git_dir, None, opts).map_err(|e| wrap(opts, e))
}

/// Submodule-aware variant: the diff runs inside a materialized worktree of
/// the `to` commit so submodule content changes are part of the patch.
pub fn create_patch_with_submodules(
    out_path: &Path,
    git_dir: &Path,
    work_tree_cache_dir: &Path,
    opts: &PatchOptions,
) -> Result<PatchDescriptor, DigestError> {
    with_work_tree(
        git_dir,
        work_tree_cache_dir,
        &opts.to_commit,
        &WorkTreeOptions { has_submodules: true },
        |work_tree_dir| write_patch(out_path, git_dir, Some(work_tree_dir), opts),
    )
    .map_err(|e| wrap(opts, e))
}

fn wrap(opts: &PatchOptions, source: DigestError) -> DigestError {
    DigestError::Patch {
        from_commit: opts.from_commit.clone(),
        to_commit: opts.to_commit.clone(),
        source: Box::new(source),
    }
}

fn write_patch(
    out_path: &Path,
    git_dir: &Path,
    work_tree_dir: Option<&Path>,
    opts: &PatchOptions,
) -> Result<PatchDescriptor, DigestError> {
    let mut args: Vec<String> = Vec::new();
    if work_tree_dir.is_none() {
        args.push(format!("--git-dir={}", git_dir.to_string_lossy()));
    }
    args.extend(["diff".into(), "--no-color".into()]);
    if work_tree_dir.is_some() {
        args.push("--submodule=diff".into());
    }
    if opts.with_entire_file_context {
        args.push("-W".into());
    }
    if opts.with_binary {
        args.push("--binary".into());
    }
    args.push(opts.from_commit.clone());
    args.push(opts.to_commit.clone());

    let pathspecs = filter_pathspecs(&opts.base_path, &opts.include_globs, &opts.exclude_globs);
    if !pathspecs.is_empty() {
        args.push("--".into());
        args.extend(pathspecs);
    }

    let diff = git_output(&args, work_tree_dir)?;
    fs::write(out_path, diff).map_err(|e| DigestError::io(out_path, e))?;

    Ok(PatchDescriptor {
        from_commit: opts.from_commit.clone(),
        to_commit: opts.to_commit.clone(),
        file_path: out_path.to_path_buf(),
    })
}
