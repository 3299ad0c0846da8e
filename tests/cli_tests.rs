//! Integration tests for CLI

use assert_cmd::Command;
use git2::{IndexAddOption, Repository, Signature};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn repo_digest() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("repo-digest"))
}

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir parents");
    }
    fs::write(path, content).expect("write file");
}

fn commit_all(repo: &Repository, message: &str) -> String {
    let mut index = repo.index().expect("index");
    index.add_all(["."].iter(), IndexAddOption::DEFAULT, None).expect("stage");
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("tree");
    let signature = Signature::now("tester", "tester@example.com").expect("signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .expect("commit")
        .to_string()
}

fn demo_repo() -> (TempDir, String) {
    let tmp = TempDir::new().expect("tmp");
    let repo = Repository::init(tmp.path()).expect("init");
    write_file(tmp.path(), "README.md", "hello\n");
    write_file(tmp.path(), "src/a.c", "int a;\n");
    let commit = commit_all(&repo, "initial");
    (tmp, commit)
}

#[test]
fn test_cli_version() {
    let mut cmd = repo_digest();
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("repo-digest"));
}

#[test]
fn test_cli_help_lists_subcommands() {
    let mut cmd = repo_digest();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("checksum"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("find-commit"))
        .stdout(predicate::str::contains("patch"))
        .stdout(predicate::str::contains("archive"));
}

#[test]
fn test_checksum_prints_hex_digest() {
    let (repo, _commit) = demo_repo();
    let cache = TempDir::new().expect("cache");

    let mut cmd = repo_digest();
    cmd.args([
        "checksum",
        "--path",
        repo.path().to_str().expect("utf8 path"),
        "--worktree-cache",
        cache.path().to_str().expect("utf8 path"),
    ]);
    cmd.assert().success().stdout(predicate::str::is_match("^[0-9a-f]{64}\n$").expect("regex"));
}

#[test]
fn test_checksum_strategies_agree_on_determinism() {
    let (repo, commit) = demo_repo();
    let cache = TempDir::new().expect("cache");

    for strategy in ["worktree", "tree"] {
        let run = |cache: &Path| {
            let mut cmd = repo_digest();
            cmd.args([
                "checksum",
                "--path",
                repo.path().to_str().expect("utf8 path"),
                "--commit",
                &commit,
                "--strategy",
                strategy,
                "--worktree-cache",
                cache.to_str().expect("utf8 path"),
            ]);
            let out = cmd.assert().success().get_output().stdout.clone();
            String::from_utf8(out).expect("utf8 stdout")
        };

        let first = run(cache.path());
        let second = run(cache.path());
        assert_eq!(first, second, "{strategy} digest must be stable across runs");
    }
}

#[test]
fn test_checksum_json_report() {
    let (repo, commit) = demo_repo();
    let cache = TempDir::new().expect("cache");

    let mut cmd = repo_digest();
    cmd.args([
        "checksum",
        "--path",
        repo.path().to_str().expect("utf8 path"),
        "--strategy",
        "tree",
        "--worktree-cache",
        cache.path().to_str().expect("utf8 path"),
        "--json",
        "missing/*.c",
    ]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(report["commit"], serde_json::json!(commit));
    assert_eq!(report["strategy"], serde_json::json!("tree"));
    assert_eq!(report["no_match_paths"], serde_json::json!(["missing/*.c"]));
    assert!(report["digest"].as_str().expect("digest").len() == 64);
}

#[test]
fn test_checksum_rejects_malformed_commit() {
    let (repo, _commit) = demo_repo();
    let cache = TempDir::new().expect("cache");

    let mut cmd = repo_digest();
    cmd.args([
        "checksum",
        "--path",
        repo.path().to_str().expect("utf8 path"),
        "--commit",
        "not-a-hash",
        "--worktree-cache",
        cache.path().to_str().expect("utf8 path"),
    ]);
    cmd.assert().failure().stderr(predicate::str::contains("bad commit hash"));
}

#[test]
fn test_info_reports_repository_state() {
    let (repo, commit) = demo_repo();

    let mut cmd = repo_digest();
    cmd.args(["info", repo.path().to_str().expect("utf8 path")]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Repository:"))
        .stdout(predicate::str::contains(&commit));
}

#[test]
fn test_find_commit_matches_message() {
    let tmp = TempDir::new().expect("tmp");
    let repo = Repository::init(tmp.path()).expect("init");
    write_file(tmp.path(), "f.txt", "1\n");
    let fix = commit_all(&repo, "Fix: broken build");
    write_file(tmp.path(), "f.txt", "2\n");
    commit_all(&repo, "Add feature");

    let mut cmd = repo_digest();
    cmd.args(["find-commit", "^Fix: .*", "--path", tmp.path().to_str().expect("utf8 path")]);
    cmd.assert().success().stdout(predicate::str::contains(&fix));
}

#[test]
fn test_patch_between_commits() {
    let tmp = TempDir::new().expect("tmp");
    let repo = Repository::init(tmp.path()).expect("init");
    write_file(tmp.path(), "src/a.c", "int a;\n");
    let from = commit_all(&repo, "initial");
    write_file(tmp.path(), "src/a.c", "int a_changed;\n");
    let to = commit_all(&repo, "change a");

    let out = TempDir::new().expect("out");
    let patch_path = out.path().join("change.patch");

    let mut cmd = repo_digest();
    cmd.args([
        "patch",
        "--path",
        tmp.path().to_str().expect("utf8 path"),
        "--from",
        &from,
        "--to",
        &to,
        "--output",
        patch_path.to_str().expect("utf8 path"),
    ]);
    cmd.assert().success();

    let patch = fs::read_to_string(&patch_path).expect("read patch");
    assert!(patch.contains("diff --git"), "patch should contain a diff header");
    assert!(patch.contains("a_changed"), "patch should contain the new content");
}

#[test]
fn test_archive_writes_tar_stream() {
    let (repo, commit) = demo_repo();
    let out = TempDir::new().expect("out");
    let tar_path = out.path().join("snapshot.tar");

    let mut cmd = repo_digest();
    cmd.args([
        "archive",
        "--path",
        repo.path().to_str().expect("utf8 path"),
        "--commit",
        &commit,
        "--output",
        tar_path.to_str().expect("utf8 path"),
    ]);
    cmd.assert().success();

    let tar = fs::read(&tar_path).expect("read tar");
    assert!(!tar.is_empty(), "archive should not be empty");
}
