//! Integration tests for wsu

mod cli;
mod graph_props;
mod scenarios;

use std::path::Path;
use tempfile::TempDir;

/// Scaffold an npm-style workspace with the given members.
///
/// Each member is `(relative dir, name, deps, scripts)`; the root manifest
/// declares `packages/*` and `apps/*` and a package-lock.json marks npm as
/// the active manager.
pub fn scaffold_workspace(members: &[Member]) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("package.json"),
        r#"{"name": "fixture-root", "workspaces": ["packages/*", "apps/*"]}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("package-lock.json"), "{}").unwrap();

    for member in members {
        write_member(dir.path(), member);
    }
    dir
}

pub struct Member {
    pub rel: &'static str,
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub scripts: &'static [(&'static str, &'static str)],
}

pub fn write_member(root: &Path, member: &Member) {
    let dir = root.join(member.rel);
    std::fs::create_dir_all(&dir).unwrap();

    let deps: serde_json::Map<String, serde_json::Value> = member
        .deps
        .iter()
        .map(|d| (d.to_string(), serde_json::Value::String("*".into())))
        .collect();
    let scripts: serde_json::Map<String, serde_json::Value> = member
        .scripts
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();

    let manifest = serde_json::json!({
        "name": member.name,
        "version": "1.0.0",
        "scripts": scripts,
        "dependencies": deps,
    });
    std::fs::write(
        dir.join("package.json"),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();
    std::fs::write(dir.join("index.js"), format!("// {}\n", member.name)).unwrap();
}

/// The classic diamond: core <- lib1, lib2 <- app
pub fn diamond() -> Vec<Member> {
    vec![
        Member {
            rel: "packages/core",
            name: "core",
            deps: &[],
            scripts: &[("build", "node -e 0")],
        },
        Member {
            rel: "packages/lib1",
            name: "lib1",
            deps: &["core"],
            scripts: &[("build", "node -e 0")],
        },
        Member {
            rel: "packages/lib2",
            name: "lib2",
            deps: &["core"],
            scripts: &[("build", "node -e 0")],
        },
        Member {
            rel: "apps/app",
            name: "app",
            deps: &["lib1", "lib2"],
            scripts: &[("build", "node -e 0")],
        },
    ]
}
