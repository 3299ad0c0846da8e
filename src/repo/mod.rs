//! Repository backends and the capability they share.

use std::path::Path;

use crate::checksum::{Checksum, ChecksumOptions};
use crate::error::DigestError;
use crate::gitcli::{ArchiveDescriptor, ArchiveOptions, PatchDescriptor, PatchOptions};

pub mod local;
pub mod queries;
pub mod remote;

pub use local::LocalRepo;
pub use remote::RemoteRepo;

/// Operation set shared by local and remote repositories.
///
/// Implementations may differ in how the on-disk object store comes to be
/// (a path the caller owns vs. a managed clone), but every operation reads
/// the same way: open fresh, perform a single read, drop the handle.
pub trait GitRepo {
    fn name(&self) -> &str;

    /// Object id of `HEAD`'s target commit.
    fn head_commit(&self) -> Result<String, DigestError>;

    /// Branch `HEAD` points at, without the `refs/heads/` prefix.
    fn head_branch_name(&self) -> Result<String, DigestError>;

    /// Tip commit of `refs/heads/<branch>`.
    fn latest_branch_commit(&self, branch: &str) -> Result<String, DigestError>;

    /// Commit a tag points at, dereferencing annotated tags.
    fn tag_commit(&self, tag: &str) -> Result<String, DigestError>;

    /// First ancestor of `head_commit` (breadth-first) whose message
    /// matches the regex.
    fn find_commit_by_message(
        &self,
        head_commit: &str,
        pattern: &str,
    ) -> Result<Option<String>, DigestError>;

    fn is_empty(&self) -> Result<bool, DigestError>;

    /// Presence check: a missing commit is `false`, a corrupt store an error.
    fn is_commit_exists(&self, commit: &str) -> Result<bool, DigestError>;

    fn tags_list(&self) -> Result<Vec<String>, DigestError>;

    fn remote_branches_list(&self) -> Result<Vec<String>, DigestError>;

    fn remote_origin_url(&self) -> Result<Option<String>, DigestError>;

    fn create_patch(
        &self,
        out_path: &Path,
        opts: &PatchOptions,
    ) -> Result<PatchDescriptor, DigestError>;

    fn create_archive(
        &self,
        out_path: &Path,
        opts: &ArchiveOptions,
    ) -> Result<ArchiveDescriptor, DigestError>;

    /// Worktree-materialized checksum of the filtered snapshot.
    fn checksum(&self, opts: &ChecksumOptions) -> Result<Checksum, DigestError>;

    /// Packed-tree checksum of the filtered snapshot.
    fn checksum_from_tree(&self, opts: &ChecksumOptions) -> Result<Checksum, DigestError>;
}
