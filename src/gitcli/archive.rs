//! Tar archive extraction for one commit.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DigestError;
use crate::gitcli::{filter_pathspecs, git_output, with_work_tree, WorkTreeOptions};

#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    pub commit: String,
    pub base_path: String,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
}

/// Where a produced tar stream lives; callers treat the contents as opaque.
#[derive(Debug, Clone)]
pub struct ArchiveDescriptor {
    pub commit: String,
    pub file_path: PathBuf,
}

pub fn create_archive(
    out_path: &Path,
    git_dir: &Path,
    opts: &ArchiveOptions,
) -> Result<ArchiveDescriptor, DigestError> {
    write_archive(out_path, git_dir, None, opts)
        .map_err(|source| DigestError::Archive { commit: opts.commit.clone(), source: Box::new(source) })
}

/// Submodule-aware variant: archives from a materialized worktree so
/// submodule checkouts are resolvable.
pub fn create_archive_with_submodules(
    out_path: &Path,
    git_dir: &Path,
    work_tree_cache_dir: &Path,
    opts: &ArchiveOptions,
) -> Result<ArchiveDescriptor, DigestError> {
    with_work_tree(
        git_dir,
        work_tree_cache_dir,
        &opts.commit,
        &WorkTreeOptions { has_submodules: true },
        |work_tree_dir| write_archive(out_path, git_dir, Some(work_tree_dir), opts),
    )
    .map_err(|source| DigestError::Archive { commit: opts.commit.clone(), source: Box::new(source) })
}

fn write_archive(
    out_path: &Path,
    git_dir: &Path,
    work_tree_dir: Option<&Path>,
    opts: &ArchiveOptions,
) -> Result<ArchiveDescriptor, DigestError> {
    let mut args: Vec<String> = Vec::new();
    if work_tree_dir.is_none() {
        args.push(format!("--git-dir={}", git_dir.to_string_lossy()));
    }
    args.extend(["archive".into(), "--format=tar".into(), opts.commit.clone()]);
    args.extend(filter_pathspecs(&opts.base_path, &opts.include_globs, &opts.exclude_globs));

    let tar = git_output(&args, work_tree_dir)?;
    fs::write(out_path, tar).map_err(|e| DigestError::io(out_path, e))?;

    Ok(ArchiveDescriptor { commit: opts.commit.clone(), file_path: out_path.to_path_buf() })
}
