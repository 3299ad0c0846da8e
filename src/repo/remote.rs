//! URL-identified repository backend maintained as a managed clone.

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::debug;

use crate::checksum::{Checksum, ChecksumOptions};
use crate::error::DigestError;
use crate::gitcli::{ArchiveDescriptor, ArchiveOptions, PatchDescriptor, PatchOptions};
use crate::repo::{GitRepo, LocalRepo};

/// A repository reached by URL.
///
/// The clone lives under `clones_dir/<name>` and is created on first use;
/// [`RemoteRepo::fetch`] refreshes it. Every query operates on the clone
/// through the same code paths as [`LocalRepo`].
pub struct RemoteRepo {
    name: String,
    url: String,
    clone_path: PathBuf,
    work_tree_cache_dir: PathBuf,
}

impl RemoteRepo {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        clones_dir: &Path,
        work_tree_cache_dir: impl Into<PathBuf>,
    ) -> Self {
        let name = name.into();
        let clone_path = clones_dir.join(&name);
        RemoteRepo { name, url: url.into(), clone_path, work_tree_cache_dir: work_tree_cache_dir.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn clone_path(&self) -> &Path {
        &self.clone_path
    }

    /// Clones on first use, otherwise leaves the existing clone untouched.
    fn ensure_cloned(&self) -> Result<(), DigestError> {
        if self.clone_path.join(".git").exists() || self.clone_path.join("HEAD").exists() {
            return Ok(());
        }

        debug!(url = %self.url, dest = %self.clone_path.display(), "cloning remote repository");
        Repository::clone(&self.url, &self.clone_path).map_err(|source| DigestError::BadRepo {
            path: self.clone_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Updates the clone from its origin.
    pub fn fetch(&self) -> Result<(), DigestError> {
        self.ensure_cloned()?;
        let repo = Repository::open(&self.clone_path).map_err(|source| DigestError::BadRepo {
            path: self.clone_path.clone(),
            source,
        })?;
        let mut remote = repo.find_remote("origin")?;
        remote.fetch(&[] as &[&str], None, None)?;
        Ok(())
    }

    fn local(&self) -> Result<LocalRepo, DigestError> {
        self.ensure_cloned()?;
        LocalRepo::open(self.name.clone(), self.clone_path.clone(), self.work_tree_cache_dir.clone())
    }
}

impl GitRepo for RemoteRepo {
    fn name(&self) -> &str {
        &self.name
    }

    fn head_commit(&self) -> Result<String, DigestError> {
        self.local()?.head_commit()
    }

    fn head_branch_name(&self) -> Result<String, DigestError> {
        self.local()?.head_branch_name()
    }

    fn latest_branch_commit(&self, branch: &str) -> Result<String, DigestError> {
        self.local()?.latest_branch_commit(branch)
    }

    fn tag_commit(&self, tag: &str) -> Result<String, DigestError> {
        self.local()?.tag_commit(tag)
    }

    fn find_commit_by_message(
        &self,
        head_commit: &str,
        pattern: &str,
    ) -> Result<Option<String>, DigestError> {
        self.local()?.find_commit_by_message(head_commit, pattern)
    }

    fn is_empty(&self) -> Result<bool, DigestError> {
        self.local()?.is_empty()
    }

    fn is_commit_exists(&self, commit: &str) -> Result<bool, DigestError> {
        self.local()?.is_commit_exists(commit)
    }

    fn tags_list(&self) -> Result<Vec<String>, DigestError> {
        self.local()?.tags_list()
    }

    fn remote_branches_list(&self) -> Result<Vec<String>, DigestError> {
        self.local()?.remote_branches_list()
    }

    fn remote_origin_url(&self) -> Result<Option<String>, DigestError> {
        self.local()?.remote_origin_url()
    }

    fn create_patch(
        &self,
        out_path: &Path,
        opts: &PatchOptions,
    ) -> Result<PatchDescriptor, DigestError> {
        self.local()?.create_patch(out_path, opts)
    }

    fn create_archive(
        &self,
        out_path: &Path,
        opts: &ArchiveOptions,
    ) -> Result<ArchiveDescriptor, DigestError> {
        self.local()?.create_archive(out_path, opts)
    }

    fn checksum(&self, opts: &ChecksumOptions) -> Result<Checksum, DigestError> {
        self.local()?.checksum(opts)
    }

    fn checksum_from_tree(&self, opts: &ChecksumOptions) -> Result<Checksum, DigestError> {
        self.local()?.checksum_from_tree(opts)
    }
}
