//! CLI smoke tests — run the `templar` binary against a scratch HOME.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use templar_core::config::{save_config_at, Config};
use templar_core::types::Repository;

fn templar(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("templar").expect("binary");
    cmd.env("HOME", home).env("USERPROFILE", home);
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
    std::fs::write(path, content).expect("write");
}

fn configure_repo(home: &Path, repo_root: &Path) {
    let config = Config {
        repositories: vec![Repository {
            id: "main".into(),
            name: "Main templates".into(),
            path: repo_root.to_path_buf(),
        }],
        ..Default::default()
    };
    save_config_at(home, &config).expect("save config");
}

fn plain_repo() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "hello.txt", "hello from {{= data.author.fullName }}\n");
    write(
        dir.path(),
        "templates.json",
        r#"{"templates": [{
            "name": "hello",
            "description": "A greeting file",
            "category": "Demo",
            "files": [{"source": "hello.txt", "destination": "hello.txt"}]
        }]}"#,
    );
    dir
}

#[test]
fn list_without_config_reports_nothing() {
    let home = TempDir::new().expect("tempdir");
    templar(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No templates discovered."));
}

#[test]
fn list_shows_discovered_templates() {
    let home = TempDir::new().expect("tempdir");
    let repo = plain_repo();
    configure_repo(home.path(), repo.path());

    templar(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("Demo"));
}

#[test]
fn list_json_is_machine_readable() {
    let home = TempDir::new().expect("tempdir");
    let repo = plain_repo();
    configure_repo(home.path(), repo.path());

    let output = templar(home.path())
        .args(["list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(payload["templates"][0]["name"], "hello");
    assert_eq!(payload["templates"][0]["files"], 1);
}

#[test]
fn check_fails_on_malformed_descriptor() {
    let home = TempDir::new().expect("tempdir");
    let repo = TempDir::new().expect("tempdir");
    write(repo.path(), "templates.json", "{not json");
    configure_repo(home.path(), repo.path());

    templar(home.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error-level"));
}

#[test]
fn check_passes_on_clean_repository() {
    let home = TempDir::new().expect("tempdir");
    let repo = plain_repo();
    configure_repo(home.path(), repo.path());

    templar(home.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("no problems found"));
}

#[test]
fn new_without_repositories_fails() {
    let home = TempDir::new().expect("tempdir");
    templar(home.path())
        .args(["new", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no template repositories configured"));
}

#[test]
fn new_renders_a_parameterless_template() {
    let home = TempDir::new().expect("tempdir");
    let repo = plain_repo();
    configure_repo(home.path(), repo.path());
    let target = TempDir::new().expect("tempdir");

    templar(home.path())
        .args(["new", "hello", "--target"])
        .arg(target.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file(s) created"));

    let content = std::fs::read_to_string(target.path().join("hello.txt")).expect("read");
    assert_eq!(content, "hello from \n", "empty author config renders blank");
}

#[test]
fn new_with_unknown_name_fails() {
    let home = TempDir::new().expect("tempdir");
    let repo = plain_repo();
    configure_repo(home.path(), repo.path());

    templar(home.path())
        .args(["new", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no template named 'nope'"));
}
