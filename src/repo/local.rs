//! On-disk repository backend.

use std::path::{Path, PathBuf};

use crate::checksum::{tree_checksum, worktree_checksum, Checksum, ChecksumOptions};
use crate::error::DigestError;
use crate::gitcli::{self, ArchiveDescriptor, ArchiveOptions, PatchDescriptor, PatchOptions};
use crate::repo::queries;
use crate::repo::GitRepo;

/// A repository the caller already has on disk.
pub struct LocalRepo {
    name: String,
    path: PathBuf,
    git_dir: PathBuf,
    work_tree_cache_dir: PathBuf,
}

impl LocalRepo {
    /// Opens the repository, resolving its actual git directory (handles
    /// both normal checkouts and bare repositories).
    pub fn open(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        work_tree_cache_dir: impl Into<PathBuf>,
    ) -> Result<Self, DigestError> {
        let path = path.into();
        let repo = queries::open_repository(&path)?;
        let git_dir = repo.path().to_path_buf();

        Ok(LocalRepo {
            name: name.into(),
            path,
            git_dir,
            work_tree_cache_dir: work_tree_cache_dir.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn has_submodules(&self, commit: &str) -> Result<bool, DigestError> {
        let repo = queries::open_repository(&self.path)?;
        let commit = queries::find_commit(&repo, commit)?;
        queries::has_submodules_in_commit(&commit)
    }
}

impl GitRepo for LocalRepo {
    fn name(&self) -> &str {
        &self.name
    }

    fn head_commit(&self) -> Result<String, DigestError> {
        queries::head_commit(&self.path)
    }

    fn head_branch_name(&self) -> Result<String, DigestError> {
        queries::head_branch_name(&self.path)
    }

    fn latest_branch_commit(&self, branch: &str) -> Result<String, DigestError> {
        queries::latest_branch_commit(&self.path, branch)
    }

    fn tag_commit(&self, tag: &str) -> Result<String, DigestError> {
        queries::tag_commit(&self.path, tag)
    }

    fn find_commit_by_message(
        &self,
        head_commit: &str,
        pattern: &str,
    ) -> Result<Option<String>, DigestError> {
        queries::find_commit_by_message(&self.path, head_commit, pattern)
    }

    fn is_empty(&self) -> Result<bool, DigestError> {
        queries::is_empty(&self.path)
    }

    fn is_commit_exists(&self, commit: &str) -> Result<bool, DigestError> {
        queries::is_commit_exists(&self.path, commit)
    }

    fn tags_list(&self) -> Result<Vec<String>, DigestError> {
        queries::tags_list(&self.path)
    }

    fn remote_branches_list(&self) -> Result<Vec<String>, DigestError> {
        queries::remote_branches_list(&self.path)
    }

    fn remote_origin_url(&self) -> Result<Option<String>, DigestError> {
        queries::remote_origin_url(&self.path)
    }

    fn create_patch(
        &self,
        out_path: &Path,
        opts: &PatchOptions,
    ) -> Result<PatchDescriptor, DigestError> {
        // Validate both ends of the range before shelling out.
        let repo = queries::open_repository(&self.path)?;
        queries::find_commit(&repo, &opts.from_commit)?;
        queries::find_commit(&repo, &opts.to_commit)?;
        drop(repo);

        if self.has_submodules(&opts.to_commit)? {
            gitcli::create_patch_with_submodules(
                out_path,
                &self.git_dir,
                &self.work_tree_cache_dir,
                opts,
            )
        } else {
            gitcli::create_patch(out_path, &self.git_dir, opts)
        }
    }

    fn create_archive(
        &self,
        out_path: &Path,
        opts: &ArchiveOptions,
    ) -> Result<ArchiveDescriptor, DigestError> {
        if self.has_submodules(&opts.commit)? {
            gitcli::create_archive_with_submodules(
                out_path,
                &self.git_dir,
                &self.work_tree_cache_dir,
                opts,
            )
        } else {
            gitcli::create_archive(out_path, &self.git_dir, opts)
        }
    }

    fn checksum(&self, opts: &ChecksumOptions) -> Result<Checksum, DigestError> {
        worktree_checksum(&self.path, &self.git_dir, &self.work_tree_cache_dir, opts)
    }

    fn checksum_from_tree(&self, opts: &ChecksumOptions) -> Result<Checksum, DigestError> {
        tree_checksum(&self.path, &self.git_dir, &self.work_tree_cache_dir, opts)
    }
}
