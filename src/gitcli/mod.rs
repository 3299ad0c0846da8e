//! Collaborators that drive the host `git` binary.
//!
//! Worktree materialization, patch extraction and archive extraction all
//! shell out to `git`; the checksum engines consume only the directories and
//! descriptors these helpers produce.

use std::path::Path;
use std::process::Command;

use crate::error::DigestError;

pub mod archive;
pub mod patch;
pub mod worktree;

pub use archive::{create_archive, create_archive_with_submodules, ArchiveDescriptor, ArchiveOptions};
pub use patch::{create_patch, create_patch_with_submodules, PatchDescriptor, PatchOptions};
pub use worktree::{with_work_tree, WorkTreeOptions};

/// Runs `git` with the given arguments, returning captured stdout.
///
/// A non-zero exit or a spawn failure surfaces as
/// [`DigestError::GitCommand`] carrying the rendered command line and the
/// trailing stderr.
pub(crate) fn git_output(args: &[String], cwd: Option<&Path>) -> Result<Vec<u8>, DigestError> {
    let rendered = format!("git {}", args.join(" "));

    let mut command = Command::new("git");
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command
        .args(args)
        .output()
        .map_err(|e| DigestError::GitCommand { command: rendered.clone(), message: e.to_string() })?;

    if !output.status.success() {
        return Err(DigestError::GitCommand {
            command: rendered,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}

/// Renders a `(basePath, includeGlobs, excludeGlobs)` filter as git
/// pathspecs: includes joined under the base path, excludes with
/// `:(exclude)` magic.
pub(crate) fn filter_pathspecs(
    base_path: &str,
    include_globs: &[String],
    exclude_globs: &[String],
) -> Vec<String> {
    let join = |pattern: &str| {
        if base_path.is_empty() {
            pattern.to_string()
        } else {
            format!("{base_path}/{pattern}")
        }
    };

    let mut specs = Vec::new();

    if include_globs.is_empty() {
        if !base_path.is_empty() {
            specs.push(base_path.to_string());
        }
    } else {
        specs.extend(include_globs.iter().map(|p| join(p)));
    }

    specs.extend(exclude_globs.iter().map(|p| format!(":(exclude){}", join(p))));

    specs
}
