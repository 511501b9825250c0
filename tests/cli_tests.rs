use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary invocation isolated in an empty working directory.
fn auto_merge(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("auto-merge").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_every_step() {
    let dir = TempDir::new().unwrap();
    auto_merge(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("open-pr"))
        .stdout(predicate::str::contains("cleanup"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_prints_defaults() {
    let dir = TempDir::new().unwrap();
    auto_merge(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("primary_branch = \"main\""))
        .stdout(predicate::str::contains("source_branch = \"legacy/main\""))
        .stdout(predicate::str::contains("delete_after_seconds = 60"))
        .stdout(predicate::str::contains("\"package.json\""))
        .stdout(predicate::str::contains("validate_before_merge = false"));
}

#[test]
fn test_config_file_in_working_directory_is_loaded() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("auto-merge.toml"),
        "[repository]\nsource_branch = \"upstream/main\"\n\n[merge]\nvalidate_before_merge = true\n",
    )
    .unwrap();

    auto_merge(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("source_branch = \"upstream/main\""))
        .stdout(predicate::str::contains("validate_before_merge = true"));
}

#[test]
fn test_environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("auto-merge.toml"),
        "[repository]\nprimary_branch = \"develop\"\n",
    )
    .unwrap();

    auto_merge(&dir)
        .arg("config")
        .env("AUTO_MERGE__REPOSITORY__PRIMARY_BRANCH", "trunk")
        .env("AUTO_MERGE__MERGE__PROTECTED_FILES", "Cargo.toml,Cargo.lock")
        .assert()
        .success()
        .stdout(predicate::str::contains("primary_branch = \"trunk\""))
        .stdout(predicate::str::contains("\"Cargo.lock\""))
        .stdout(predicate::str::contains("yarn.lock").not());
}

#[test]
fn test_delay_flag_overrides_configured_delay() {
    let dir = TempDir::new().unwrap();
    auto_merge(&dir)
        .args(["config", "--delay", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("delete_after_seconds = 5"));
}

#[test]
fn test_missing_explicit_config_file_fails() {
    let dir = TempDir::new().unwrap();
    auto_merge(&dir)
        .args(["--config", "nope.toml", "config"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("❌"));
}

#[test]
fn test_invalid_branch_prefix_is_rejected() {
    let dir = TempDir::new().unwrap();
    auto_merge(&dir)
        .arg("config")
        .env("AUTO_MERGE__MERGE__BRANCH_PREFIX", "auto merge")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("merge.branch_prefix"));
}

#[test]
fn test_missing_git_binary_fails_validation_with_exit_code_one() {
    let dir = TempDir::new().unwrap();
    auto_merge(&dir)
        .arg("validate")
        .env("AUTO_MERGE__TOOLS__GIT", "definitely-not-a-git-binary")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Command not found"));
}

#[test]
fn test_missing_git_binary_fails_run_before_any_pull_request() {
    let dir = TempDir::new().unwrap();
    auto_merge(&dir)
        .env("AUTO_MERGE__TOOLS__GIT", "definitely-not-a-git-binary")
        .env("AUTO_MERGE__TOOLS__GH", "definitely-not-gh-either")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Creating pull request").not())
        .stderr(predicate::str::contains("Please resolve manually"));
}

#[test]
fn test_cleanup_refuses_primary_branch() {
    let dir = TempDir::new().unwrap();
    auto_merge(&dir)
        .args(["cleanup", "--branch", "main"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("refusing to delete"));
}

#[test]
fn test_open_pr_requires_branch() {
    let dir = TempDir::new().unwrap();
    auto_merge(&dir).arg("open-pr").assert().code(2);
}
