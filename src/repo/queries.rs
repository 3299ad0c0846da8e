//! Repository inspection queries.
//!
//! Every query opens the repository fresh, performs a single read and lets
//! the handle drop. No state is shared between calls.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use git2::{BranchType, Commit, ObjectType, Oid, Repository};
use regex::Regex;

use crate::error::{object_lookup_error, DigestError};

const REMOTE_BRANCH_PREFIX: &str = "refs/remotes/origin/";
const TAG_PREFIX: &str = "refs/tags/";

pub(crate) fn open_repository(path: &Path) -> Result<Repository, DigestError> {
    Repository::open(path)
        .map_err(|source| DigestError::BadRepo { path: path.to_path_buf(), source })
}

/// Opens the object store at `git_dir` with `worktree_dir` as its working
/// directory, so tree-object lookups can resolve submodules through an
/// externally materialized checkout.
pub(crate) fn open_with_custom_worktree(
    git_dir: &Path,
    worktree_dir: &Path,
) -> Result<Repository, DigestError> {
    let repo = Repository::open(git_dir)
        .map_err(|source| DigestError::BadRepo { path: git_dir.to_path_buf(), source })?;
    repo.set_workdir(worktree_dir, false)?;
    Ok(repo)
}

/// Parses a full 40-hex-character commit id.
pub(crate) fn parse_commit_hash(commit: &str) -> Result<Oid, DigestError> {
    if commit.len() != 40 || !commit.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DigestError::BadHash(commit.to_string()));
    }
    Oid::from_str(commit).map_err(|_| DigestError::BadHash(commit.to_string()))
}

pub(crate) fn find_commit<'r>(
    repo: &'r Repository,
    commit: &str,
) -> Result<Commit<'r>, DigestError> {
    let oid = parse_commit_hash(commit)?;
    repo.find_commit(oid)
        .map_err(|source| DigestError::BadCommit { commit: commit.to_string(), source })
}

/// Whether the commit tree carries a `.gitmodules` blob at the root.
pub(crate) fn has_submodules_in_commit(commit: &Commit<'_>) -> Result<bool, DigestError> {
    let tree = commit.tree()?;
    Ok(tree
        .get_name(".gitmodules")
        .map(|entry| entry.kind() == Some(ObjectType::Blob))
        .unwrap_or(false))
}

pub fn head_commit(path: &Path) -> Result<String, DigestError> {
    let repo = open_repository(path)?;
    let commit = repo.head()?.peel_to_commit().map_err(object_lookup_error)?;
    Ok(commit.id().to_string())
}

/// Branch name `HEAD` points at, without the `refs/heads/` prefix.
pub fn head_branch_name(path: &Path) -> Result<String, DigestError> {
    let repo = open_repository(path)?;
    let head = repo.head()?;
    if !head.is_branch() {
        return Err(DigestError::NotABranch);
    }
    match head.shorthand() {
        Some(name) => Ok(name.to_string()),
        None => Err(DigestError::NotABranch),
    }
}

pub fn latest_branch_commit(path: &Path, branch: &str) -> Result<String, DigestError> {
    let repo = open_repository(path)?;
    let branch = repo.find_branch(branch, BranchType::Local).map_err(object_lookup_error)?;
    let commit = branch.get().peel_to_commit().map_err(object_lookup_error)?;
    Ok(commit.id().to_string())
}

/// Commit a tag points at, dereferencing annotated tags.
pub fn tag_commit(path: &Path, tag: &str) -> Result<String, DigestError> {
    let repo = open_repository(path)?;
    let object =
        repo.revparse_single(&format!("{TAG_PREFIX}{tag}")).map_err(object_lookup_error)?;
    let commit = object.peel_to_commit().map_err(object_lookup_error)?;
    Ok(commit.id().to_string())
}

/// Breadth-first search from `head_commit` over ancestors for the first
/// commit whose message matches `pattern`.
pub fn find_commit_by_message(
    path: &Path,
    head_commit: &str,
    pattern: &str,
) -> Result<Option<String>, DigestError> {
    let repo = open_repository(path)?;
    let head = find_commit(&repo, head_commit)?;

    let regex = Regex::new(pattern)
        .map_err(|source| DigestError::Regex { pattern: pattern.to_string(), source })?;

    let mut queue = VecDeque::from([head.id()]);
    let mut seen: HashSet<Oid> = HashSet::from([head.id()]);

    while let Some(oid) = queue.pop_front() {
        let commit = repo.find_commit(oid).map_err(object_lookup_error)?;
        if regex.is_match(commit.message().unwrap_or_default()) {
            return Ok(Some(oid.to_string()));
        }
        for parent in commit.parent_ids() {
            if seen.insert(parent) {
                queue.push_back(parent);
            }
        }
    }

    Ok(None)
}

/// True when the repository has no commits yet.
pub fn is_empty(path: &Path) -> Result<bool, DigestError> {
    let repo = open_repository(path)?;
    let result = match repo.head() {
        Ok(head) => Ok(head.peel_to_commit().is_err()),
        Err(err)
            if err.code() == git2::ErrorCode::UnbornBranch
                || err.code() == git2::ErrorCode::NotFound =>
        {
            Ok(true)
        }
        Err(err) => Err(err.into()),
    };
    result
}

/// Object presence check. A missing commit is `false`, not an error; a
/// malformed hash or a corrupt store still fails.
pub fn is_commit_exists(path: &Path, commit: &str) -> Result<bool, DigestError> {
    let repo = open_repository(path)?;
    let oid = parse_commit_hash(commit)?;
    let result = match repo.find_commit(oid) {
        Ok(_) => Ok(true),
        Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(false),
        Err(source) => Err(DigestError::BadCommit { commit: commit.to_string(), source }),
    };
    result
}

/// All tag names, unsorted. Annotated tags report the tag object's own name,
/// lightweight tags the reference name without the `refs/tags/` prefix.
pub fn tags_list(path: &Path) -> Result<Vec<String>, DigestError> {
    let repo = open_repository(path)?;
    let mut tags = Vec::new();

    for reference in repo.references_glob(&format!("{TAG_PREFIX}*"))? {
        let reference = reference?;
        let stripped = reference
            .name()
            .and_then(|name| name.strip_prefix(TAG_PREFIX))
            .unwrap_or_default()
            .to_string();
        match reference.peel_to_tag() {
            Ok(tag) => tags.push(tag.name().unwrap_or(&stripped).to_string()),
            Err(_) => tags.push(stripped),
        }
    }

    Ok(tags)
}

/// Remote branch names under `refs/remotes/origin/`, excluding `HEAD`.
pub fn remote_branches_list(path: &Path) -> Result<Vec<String>, DigestError> {
    let repo = open_repository(path)?;
    let mut branches = Vec::new();

    for reference in repo.references_glob(&format!("{REMOTE_BRANCH_PREFIX}*"))? {
        let reference = reference?;
        if let Some(name) = reference.name().and_then(|n| n.strip_prefix(REMOTE_BRANCH_PREFIX)) {
            if name != "HEAD" {
                branches.push(name.to_string());
            }
        }
    }

    Ok(branches)
}

/// First URL of the `origin` remote, if configured.
pub fn remote_origin_url(path: &Path) -> Result<Option<String>, DigestError> {
    let repo = open_repository(path)?;
    let result = match repo.find_remote("origin") {
        Ok(remote) => Ok(remote.url().map(String::from)),
        Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    };
    result
}
