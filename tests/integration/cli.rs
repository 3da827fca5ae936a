//! CLI surface tests
//!
//! These cover the paths that never spawn a package manager: detection
//! failures, cycle diagnosis, target selection errors, cache reporting,
//! and clean.

use crate::{diamond, scaffold_workspace, Member};
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn wsu() -> Command {
    let mut cmd = Command::cargo_bin("wsu").unwrap();
    cmd.arg("--ascii");
    cmd
}

#[test]
fn help_displays() {
    wsu()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workspace Script Utility"));
}

#[test]
fn version_displays() {
    wsu()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wsu"));
}

#[test]
fn build_outside_workspace_fails() {
    let dir = TempDir::new().unwrap();
    wsu()
        .arg("build")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No workspace detected"));
}

#[test]
fn run_without_matching_script_is_no_target() {
    let dir = scaffold_workspace(&[Member {
        rel: "packages/a",
        name: "a",
        deps: &[],
        scripts: &[],
    }]);

    wsu()
        .args(["run", "lint"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No packages to run"));
}

#[test]
fn filter_without_match_is_no_target() {
    let dir = scaffold_workspace(&diamond());
    wsu()
        .args(["run", "build", "--filter", "nothing-*"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no package name matches"));
}

#[test]
fn invalid_filter_pattern_is_rejected() {
    let dir = scaffold_workspace(&diamond());
    wsu()
        .args(["run", "build", "--filter", "pkg["])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter pattern"));
}

#[test]
fn build_reports_dependency_cycles() {
    let mut members = diamond();
    // core -> app closes the loop
    members[0] = Member {
        rel: "packages/core",
        name: "core",
        deps: &["app"],
        scripts: &[("build", "node -e 0")],
    };
    let dir = scaffold_workspace(&members);

    wsu()
        .arg("build")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("Dependency cycle detected")
                .and(predicate::str::contains("core"))
                .and(predicate::str::contains("->")),
        );
}

#[test]
fn malformed_member_manifest_is_fatal() {
    let dir = scaffold_workspace(&[]);
    let pkg_dir = dir.path().join("packages/broken");
    std::fs::create_dir_all(&pkg_dir).unwrap();
    std::fs::write(pkg_dir.join("package.json"), "{not json").unwrap();

    wsu()
        .arg("build")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse manifest"));
}

#[test]
fn nameless_member_manifest_is_fatal() {
    let dir = scaffold_workspace(&[]);
    let pkg_dir = dir.path().join("packages/anon");
    std::fs::create_dir_all(&pkg_dir).unwrap();
    std::fs::write(pkg_dir.join("package.json"), r#"{"version": "1.0.0"}"#).unwrap();

    wsu()
        .arg("build")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no package name"));
}

#[test]
fn cache_status_lists_uncached_packages() {
    let dir = scaffold_workspace(&diamond());
    wsu()
        .arg("cache")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("0 of 4 package(s) cached")
                .and(predicate::str::contains("core"))
                .and(predicate::str::contains("not cached")),
        );
}

#[test]
fn cache_clear_on_empty_cache() {
    let dir = scaffold_workspace(&diamond());
    wsu()
        .args(["cache", "clear"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 0 cache entries"));
}

#[test]
fn cache_init_adds_gitignore_line() {
    let dir = scaffold_workspace(&diamond());
    wsu().arg("cache").current_dir(dir.path()).assert().success();

    let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.lines().any(|l| l == ".wsu/"));
}

#[test]
fn clean_removes_node_modules() {
    let dir = scaffold_workspace(&diamond());
    let deps_dir = dir.path().join("packages/core/node_modules/left-pad");
    std::fs::create_dir_all(&deps_dir).unwrap();
    std::fs::write(deps_dir.join("index.js"), "x").unwrap();

    wsu()
        .arg("clean")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed node_modules"));

    assert!(!dir.path().join("packages/core/node_modules").exists());
}

#[test]
fn clean_with_filter_leaves_others_alone() {
    let dir = scaffold_workspace(&diamond());
    for rel in ["packages/core", "packages/lib1"] {
        std::fs::create_dir_all(dir.path().join(rel).join("node_modules")).unwrap();
    }

    wsu()
        .args(["clean", "--filter", "core"])
        .current_dir(dir.path())
        .assert()
        .success();

    assert!(!dir.path().join("packages/core/node_modules").exists());
    assert!(dir.path().join("packages/lib1/node_modules").exists());
}

#[test]
fn duplicate_package_names_are_fatal() {
    let dir = scaffold_workspace(&[
        Member {
            rel: "packages/one",
            name: "dup",
            deps: &[],
            scripts: &[],
        },
        Member {
            rel: "packages/two",
            name: "dup",
            deps: &[],
            scripts: &[],
        },
    ]);

    wsu()
        .arg("build")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate package name 'dup'"));
}
