//! Worktree-materialized checksum engine.
//!
//! The commit is checked out through the worktree collaborator; matching
//! files are collected per caller pattern, sorted, and streamed through
//! SHA-256 as `path ‖ octal-mode ‖ content` (regular files) or
//! `path ‖ octal-mode ‖ link-target` (symlinks).

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;

use crate::checksum::{Checksum, ChecksumOptions};
use crate::error::DigestError;
use crate::filter::{compile_glob, PathFilter};
use crate::gitcli::{with_work_tree, WorkTreeOptions};
use crate::repo::queries::{find_commit, has_submodules_in_commit, open_repository};

pub fn worktree_checksum(
    repo_path: &Path,
    git_dir: &Path,
    work_tree_cache_dir: &Path,
    opts: &ChecksumOptions,
) -> Result<Checksum, DigestError> {
    let repo = open_repository(repo_path)?;
    let commit = find_commit(&repo, &opts.commit)?;
    let has_submodules = has_submodules_in_commit(&commit)?;

    let filter = PathFilter::new(&opts.base_path, &opts.include_globs, &opts.exclude_globs)?;

    let mut hasher = Sha256::new();
    let mut no_match_paths = Vec::new();

    with_work_tree(
        git_dir,
        work_tree_cache_dir,
        &opts.commit,
        &WorkTreeOptions { has_submodules },
        |work_tree_dir| {
            let mut paths = Vec::new();

            if opts.paths.is_empty() {
                // No explicit selection: every file under the base path.
                paths = files_by_pattern(work_tree_dir, &join_base(filter.base_path(), "**/*"))?;
            } else {
                for pattern in &opts.paths {
                    let matches =
                        files_by_pattern(work_tree_dir, &join_base(filter.base_path(), pattern))?;
                    if matches.is_empty() {
                        debug!(pattern, "path pattern matched no files");
                        no_match_paths.push(pattern.clone());
                    }
                    paths.extend(matches);
                }
            }

            // The digest depends on hashing order.
            paths.sort();

            for path in &paths {
                absorb_path(&mut hasher, work_tree_dir, path, &filter)?;
            }

            Ok(())
        },
    )?;

    Ok(Checksum { digest: format!("{:x}", hasher.finalize()), no_match_paths })
}

fn join_base(base_path: &str, pattern: &str) -> String {
    if base_path.is_empty() {
        pattern.to_string()
    } else {
        format!("{base_path}/{pattern}")
    }
}

/// Expands one doublestar pattern against the worktree.
///
/// Regular files and symlinks matching the pattern are collected directly;
/// a matching directory contributes every file below it. Paths are
/// worktree-relative with `/` separators.
fn files_by_pattern(root: &Path, pattern: &str) -> Result<Vec<String>, DigestError> {
    let exact = compile_glob(pattern)?;
    let deep = compile_glob(&format!("{pattern}/**"))?;

    let mut paths = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != OsStr::new(".git"));

    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            DigestError::io(path, err.into())
        })?;

        let file_type = entry.file_type();
        if !file_type.is_file() && !file_type.is_symlink() {
            continue;
        }

        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };

        if exact.is_match(&rel) || deep.is_match(&rel) {
            paths.push(rel);
        }
    }

    Ok(paths)
}

/// Feeds one worktree entry into the running hash.
fn absorb_path(
    hasher: &mut Sha256,
    work_tree_dir: &Path,
    path: &str,
    filter: &PathFilter,
) -> Result<(), DigestError> {
    let full_path = work_tree_dir.join(path);

    if Path::new(path).file_name() == Some(OsStr::new(".git")) {
        debug!(path, "filtered out service git path");
        return Ok(());
    }

    if !filter.is_file_path_valid(path) {
        debug!(path, "excluded by path filter");
        return Ok(());
    }

    hasher.update(path.as_bytes());

    // The file must still exist after the scan.
    let metadata =
        fs::symlink_metadata(&full_path).map_err(|e| DigestError::io(&full_path, e))?;
    hasher.update(format!("{:o}", metadata.mode()).as_bytes());

    let file_type = metadata.file_type();
    if file_type.is_file() {
        let mut file = File::open(&full_path).map_err(|e| DigestError::io(&full_path, e))?;
        io::copy(&mut file, hasher).map_err(|e| DigestError::io(&full_path, e))?;
        debug!(path, mode = format!("{:o}", metadata.mode()), "added file content");
    } else if file_type.is_symlink() {
        let target = fs::read_link(&full_path).map_err(|e| DigestError::io(&full_path, e))?;
        hasher.update(target.as_os_str().as_bytes());
        debug!(path, target = %target.display(), "added symlink target");
    }
    // Devices, sockets and fifos contribute path and mode only.

    Ok(())
}
