//! Tree-object checksum engine.
//!
//! Walks tree objects in Git's canonical entry order without reading file
//! content: blobs are absorbed by object id, and a whole subtree collapses
//! into its single directory-object hash whenever no filter reaches inside
//! it. Object ids are already content hashes, so this is equivalent to
//! hashing the bytes while skipping the work.
//!
//! A worktree is still materialized so the object-model library has a
//! filesystem view for submodule resolution; the hash itself never touches
//! it.

use std::path::Path;

use git2::{Commit, ObjectType, Repository};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::checksum::{Checksum, ChecksumOptions};
use crate::error::{object_lookup_error, DigestError};
use crate::filter::TreeFilter;
use crate::gitcli::{with_work_tree, WorkTreeOptions};
use crate::repo::queries::{
    find_commit, has_submodules_in_commit, open_repository, open_with_custom_worktree,
};

pub fn tree_checksum(
    repo_path: &Path,
    git_dir: &Path,
    work_tree_cache_dir: &Path,
    opts: &ChecksumOptions,
) -> Result<Checksum, DigestError> {
    let probe = open_repository(repo_path)?;
    let has_submodules = {
        let commit = find_commit(&probe, &opts.commit)?;
        has_submodules_in_commit(&commit)?
    };

    let mut filter =
        TreeFilter::new(&opts.base_path, &opts.include_globs, &opts.exclude_globs, &opts.paths)?;
    let mut hasher = Sha256::new();

    with_work_tree(
        git_dir,
        work_tree_cache_dir,
        &opts.commit,
        &WorkTreeOptions { has_submodules },
        |work_tree_dir| {
            let repo = open_with_custom_worktree(git_dir, work_tree_dir)?;
            let commit = find_commit(&repo, &opts.commit)?;
            checksum_commit_tree(&repo, &commit, &mut filter, &mut hasher)
        },
    )?;

    Ok(Checksum { digest: format!("{:x}", hasher.finalize()), no_match_paths: filter.no_match_paths() })
}

fn checksum_commit_tree(
    repo: &Repository,
    commit: &Commit<'_>,
    filter: &mut TreeFilter,
    hasher: &mut Sha256,
) -> Result<(), DigestError> {
    let root_tree = commit.tree()?;
    let base_path = filter.base_path().to_string();

    if base_path.is_empty() {
        if filter.should_not_walk_through_tree() {
            // No glob reaches into the tree: the commit id already names the
            // whole selection.
            hasher.update(commit.id().to_string().as_bytes());
            return Ok(());
        }
        return walk_tree(repo, &root_tree, "", filter, hasher);
    }

    let entry = root_tree.get_path(Path::new(&base_path)).map_err(object_lookup_error)?;
    match entry.kind() {
        Some(ObjectType::Tree) => {
            if filter.should_not_walk_through_tree() {
                hasher.update(commit.id().to_string().as_bytes());
                return Ok(());
            }
            let tree = repo.find_tree(entry.id()).map_err(object_lookup_error)?;
            walk_tree(repo, &tree, &base_path, filter, hasher)
        }
        Some(ObjectType::Commit) => {
            if filter.should_not_walk_through_tree() {
                // The selection is exactly the pinned submodule state.
                hasher.update(entry.id().to_string().as_bytes());
                return Ok(());
            }
            let sub_repo = open_submodule(repo, &base_path)?;
            let sub_commit = sub_repo.find_commit(entry.id()).map_err(object_lookup_error)?;
            let sub_tree = sub_commit.tree()?;
            walk_tree(&sub_repo, &sub_tree, &base_path, filter, hasher)
        }
        _ => Err(DigestError::BadBasePath(base_path)),
    }
}

fn walk_tree(
    repo: &Repository,
    tree: &git2::Tree<'_>,
    tree_path: &str,
    filter: &mut TreeFilter,
    hasher: &mut Sha256,
) -> Result<(), DigestError> {
    for entry in tree.iter() {
        let name = String::from_utf8_lossy(entry.name_bytes()).into_owned();
        let entry_path =
            if tree_path.is_empty() { name.clone() } else { format!("{tree_path}/{name}") };

        match entry.kind() {
            Some(ObjectType::Tree) => {
                let check = filter.check_entry(&name)?;
                if !check.is_valid {
                    debug!(path = %entry_path, "skip dir");
                    continue;
                }
                if !check.should_descend {
                    debug!(path = %entry_path, "use dir hash");
                    filter.note_collapsed_entry(&name)?;
                    hasher.update(entry.id().to_string().as_bytes());
                } else {
                    debug!(path = %entry_path, "go into dir");
                    let subtree = repo.find_tree(entry.id()).map_err(object_lookup_error)?;
                    filter.without_entry_in_paths(&name, |filter| {
                        walk_tree(repo, &subtree, &entry_path, filter, hasher)
                    })?;
                }
            }
            Some(ObjectType::Commit) => {
                let check = filter.check_entry(&name)?;
                if !check.is_valid {
                    debug!(path = %entry_path, "skip submodule");
                    continue;
                }
                if !check.should_descend {
                    debug!(path = %entry_path, "use submodule hash");
                    filter.note_collapsed_entry(&name)?;
                    hasher.update(entry.id().to_string().as_bytes());
                } else {
                    debug!(path = %entry_path, "go into submodule");
                    let sub_repo = open_submodule(repo, &entry_path)?;
                    let sub_commit =
                        sub_repo.find_commit(entry.id()).map_err(object_lookup_error)?;
                    let sub_tree = sub_commit.tree()?;
                    filter.without_entry_in_paths(&name, |filter| {
                        walk_tree(&sub_repo, &sub_tree, &entry_path, filter, hasher)
                    })?;
                }
            }
            _ => {
                if filter.is_file_path_valid(&entry_path) {
                    debug!(path = %entry_path, "add file");
                    hasher.update(entry.id().to_string().as_bytes());
                } else {
                    debug!(path = %entry_path, "skip file");
                }
            }
        }
    }

    Ok(())
}

/// Opens the nested repository behind a gitlink entry.
fn open_submodule(repo: &Repository, path_in_repo: &str) -> Result<Repository, DigestError> {
    let submodule = repo.find_submodule(path_in_repo).map_err(object_lookup_error)?;
    submodule.open().map_err(object_lookup_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{commit_all, init_repo, object_id_at, write_file};
    use tempfile::TempDir;

    fn opts(commit: &str) -> ChecksumOptions {
        ChecksumOptions { commit: commit.to_string(), ..Default::default() }
    }

    fn run(repo_dir: &Path, cache_dir: &Path, opts: &ChecksumOptions) -> Checksum {
        tree_checksum(repo_dir, &repo_dir.join(".git"), cache_dir, opts).expect("checksum")
    }

    fn sha256_hex(parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    #[test]
    fn empty_filter_digest_is_the_commit_hash() {
        let repo_tmp = TempDir::new().expect("repo tmp");
        let cache = TempDir::new().expect("cache tmp");
        let repo = init_repo(repo_tmp.path());
        write_file(repo_tmp.path(), "README.md", "hello\n");
        let commit = commit_all(&repo, "initial");

        let checksum = run(repo_tmp.path(), cache.path(), &opts(&commit));
        assert_eq!(checksum.digest, sha256_hex(&[&commit]));
    }

    #[test]
    fn include_absorbs_the_blob_object_id() {
        let repo_tmp = TempDir::new().expect("repo tmp");
        let cache = TempDir::new().expect("cache tmp");
        let repo = init_repo(repo_tmp.path());
        write_file(repo_tmp.path(), "README.md", "hello\n");
        let commit = commit_all(&repo, "initial");

        let mut filtered = opts(&commit);
        filtered.include_globs = vec!["README.md".to_string()];
        let checksum = run(repo_tmp.path(), cache.path(), &filtered);

        let blob = object_id_at(&repo, &commit, "README.md");
        assert_eq!(checksum.digest, sha256_hex(&[&blob]));
        assert_ne!(checksum.digest, sha256_hex(&[&commit]));
    }

    #[test]
    fn unfiltered_subtree_collapses_to_its_directory_hash() {
        let repo_tmp = TempDir::new().expect("repo tmp");
        let cache = TempDir::new().expect("cache tmp");
        let repo = init_repo(repo_tmp.path());
        write_file(repo_tmp.path(), "src/a.c", "int a;\n");
        write_file(repo_tmp.path(), "src/b.c", "int b;\n");
        write_file(repo_tmp.path(), "docs/x.md", "# x\n");
        let first = commit_all(&repo, "initial");

        let mut excluding = opts(&first);
        excluding.exclude_globs = vec!["docs".to_string()];
        let base = run(repo_tmp.path(), cache.path(), &excluding);

        // Touching the excluded subtree leaves the digest alone.
        write_file(repo_tmp.path(), "docs/x.md", "# x changed\n");
        let docs_changed = commit_all(&repo, "docs change");
        let mut excluding = opts(&docs_changed);
        excluding.exclude_globs = vec!["docs".to_string()];
        assert_eq!(run(repo_tmp.path(), cache.path(), &excluding).digest, base.digest);

        // Touching the admitted subtree does not.
        write_file(repo_tmp.path(), "src/a.c", "int a_changed;\n");
        let src_changed = commit_all(&repo, "src change");
        let mut excluding = opts(&src_changed);
        excluding.exclude_globs = vec!["docs".to_string()];
        assert_ne!(run(repo_tmp.path(), cache.path(), &excluding).digest, base.digest);
    }

    #[test]
    fn canonical_order_and_pruning_compose() {
        let repo_tmp = TempDir::new().expect("repo tmp");
        let cache = TempDir::new().expect("cache tmp");
        let repo = init_repo(repo_tmp.path());
        write_file(repo_tmp.path(), "docs/guide.md", "# guide\n");
        write_file(repo_tmp.path(), "docs/internal/secret.txt", "s\n");
        write_file(repo_tmp.path(), "src/a.c", "int a;\n");
        let commit = commit_all(&repo, "initial");

        let mut excluding = opts(&commit);
        excluding.exclude_globs = vec!["docs/internal".to_string()];
        let checksum = run(repo_tmp.path(), cache.path(), &excluding);

        // `docs` must be walked (the exclude reaches inside), absorbing the
        // guide blob and skipping `internal`; `src` collapses to its tree id.
        let guide = object_id_at(&repo, &commit, "docs/guide.md");
        let src = object_id_at(&repo, &commit, "src");
        assert_eq!(checksum.digest, sha256_hex(&[&guide, &src]));
    }

    #[test]
    fn base_path_resolving_to_a_file_is_rejected() {
        let repo_tmp = TempDir::new().expect("repo tmp");
        let cache = TempDir::new().expect("cache tmp");
        let repo = init_repo(repo_tmp.path());
        write_file(repo_tmp.path(), "README.md", "hello\n");
        let commit = commit_all(&repo, "initial");

        let mut bad = opts(&commit);
        bad.base_path = "README.md".to_string();
        bad.include_globs = vec!["*".to_string()];
        let err = tree_checksum(repo_tmp.path(), &repo_tmp.path().join(".git"), cache.path(), &bad)
            .unwrap_err();
        assert!(matches!(err, DigestError::BadBasePath(_)));
    }

    #[test]
    fn base_path_scopes_the_walk_to_the_subtree() {
        let repo_tmp = TempDir::new().expect("repo tmp");
        let cache = TempDir::new().expect("cache tmp");
        let repo = init_repo(repo_tmp.path());
        write_file(repo_tmp.path(), "app/src/a.c", "int a;\n");
        write_file(repo_tmp.path(), "other/b.txt", "b\n");
        let commit = commit_all(&repo, "initial");

        let mut scoped = opts(&commit);
        scoped.base_path = "app".to_string();
        scoped.include_globs = vec!["src".to_string()];
        let checksum = run(repo_tmp.path(), cache.path(), &scoped);

        let src_tree = object_id_at(&repo, &commit, "app/src");
        assert_eq!(checksum.digest, sha256_hex(&[&src_tree]));
    }

    #[test]
    fn unmatched_patterns_are_reported() {
        let repo_tmp = TempDir::new().expect("repo tmp");
        let cache = TempDir::new().expect("cache tmp");
        let repo = init_repo(repo_tmp.path());
        write_file(repo_tmp.path(), "src/main.md", "# main\n");
        let commit = commit_all(&repo, "initial");

        let mut selecting = opts(&commit);
        selecting.paths = vec!["src/*.c".to_string()];
        let checksum = run(repo_tmp.path(), cache.path(), &selecting);

        assert_eq!(checksum.no_match_paths, vec!["src/*.c"]);
        assert_eq!(checksum.digest, format!("{:x}", Sha256::new().finalize()));
    }

    #[test]
    fn pattern_satisfied_by_a_collapsed_subtree_is_not_reported() {
        let repo_tmp = TempDir::new().expect("repo tmp");
        let cache = TempDir::new().expect("cache tmp");
        let repo = init_repo(repo_tmp.path());
        write_file(repo_tmp.path(), "src/a.c", "int a;\n");
        let commit = commit_all(&repo, "initial");

        let mut selecting = opts(&commit);
        selecting.paths = vec!["src".to_string()];
        let checksum = run(repo_tmp.path(), cache.path(), &selecting);

        let src_tree = object_id_at(&repo, &commit, "src");
        assert_eq!(checksum.digest, sha256_hex(&[&src_tree]));
        assert!(checksum.no_match_paths.is_empty());
    }
}
