//! Test fixtures: repositories built programmatically with git2.

use std::fs;
use std::path::Path;

use git2::{Commit, IndexAddOption, Repository, Signature};

pub fn init_repo(dir: &Path) -> Repository {
    Repository::init(dir).expect("init repository")
}

pub fn signature() -> Signature<'static> {
    Signature::now("tester", "tester@example.com").expect("signature")
}

/// Writes a file under the repository root, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, content).expect("write file");
}

/// Stages everything and commits, returning the new commit's hex id.
pub fn commit_all(repo: &Repository, message: &str) -> String {
    let mut index = repo.index().expect("index");
    index.add_all(["."].iter(), IndexAddOption::DEFAULT, None).expect("stage all");
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");

    let signature = signature();
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .expect("commit")
        .to_string()
}

/// Hex id of the blob or tree at `path` in the commit's tree.
pub fn object_id_at(repo: &Repository, commit: &str, path: &str) -> String {
    let oid = git2::Oid::from_str(commit).expect("commit oid");
    let commit = repo.find_commit(oid).expect("find commit");
    let tree = commit.tree().expect("tree");
    tree.get_path(Path::new(path)).expect("tree entry").id().to_string()
}
