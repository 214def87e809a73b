//! CLI integration tests for motive-build.
//!
//! Every test runs against a scratch root with its own `motive.toml`. The
//! toolchain points at `false` so nothing depends on an installed compiler,
//! and no test touches the network.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the motive-build binary command.
fn motive_build() -> Command {
    Command::cargo_bin("motive-build").unwrap()
}

/// Create a root with the given extra configuration.
fn project(config: &str) -> TempDir {
    project_with_toolchain("", config)
}

fn project_with_toolchain(toolchain: &str, config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let contents = format!(
        "[toolchain]\ncxx = \"false\"\nar = \"false\"\n{}\n{}",
        toolchain, config
    );
    fs::write(tmp.path().join("motive.toml"), contents).unwrap();
    tmp
}

fn run_in(root: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    motive_build()
        .arg("--root")
        .arg(root)
        .arg("--no-color")
        .args(args)
        .assert()
}

// ============================================================================
// motive-build --help
// ============================================================================

#[test]
fn test_help_lists_commands() {
    motive_build()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootstrap"))
        .stdout(predicate::str::contains("features"))
        .stdout(predicate::str::contains("libs"))
        .stdout(predicate::str::contains("shaders"))
        .stdout(predicate::str::contains("compile"));
}

#[test]
fn test_missing_root_is_an_error() {
    let tmp = TempDir::new().unwrap();
    run_in(&tmp.path().join("nope"), &["libs"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("root directory not found"));
}

#[test]
fn test_malformed_config_is_an_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("motive.toml"), "[engine\n").unwrap();

    run_in(tmp.path(), &["shaders"])
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

// ============================================================================
// motive-build libs
// ============================================================================

#[test]
fn test_libs_names_missing_required_library() {
    let tmp = project(
        r#"
[libraries]
required = ["motive_no_such_library_a", "motive_no_such_library_b"]
optional = []
"#,
    );

    run_in(tmp.path(), &["libs"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "missing required libraries: motive_no_such_library_a, motive_no_such_library_b",
        ));
}

#[test]
fn test_libs_prints_search_dir_library_by_path() {
    let tmp = project(
        r#"
[engine]
lib_dirs = ["vendor/lib"]

[libraries]
required = ["widget"]
optional = ["motive_no_such_optional"]
"#,
    );
    let lib_dir = tmp.path().join("vendor/lib");
    fs::create_dir_all(&lib_dir).unwrap();
    fs::write(lib_dir.join("libwidget.a"), "").unwrap();

    run_in(tmp.path(), &["libs"])
        .success()
        .stdout(predicate::str::contains("libwidget.a"))
        .stderr(predicate::str::contains("motive_no_such_optional"));
}

// ============================================================================
// motive-build shaders
// ============================================================================

#[test]
fn test_shaders_without_directory_is_skipped() {
    let tmp = project("");

    run_in(tmp.path(), &["shaders"])
        .success()
        .stderr(predicate::str::contains("Skipped"));
}

#[test]
fn test_shaders_with_empty_directory_succeeds() {
    let tmp = project("");
    fs::create_dir_all(tmp.path().join("shaders")).unwrap();

    run_in(tmp.path(), &["shaders"])
        .success()
        .stderr(predicate::str::contains("0 shader(s)"));
}

#[test]
fn test_missing_shader_compiler_is_reported() {
    let tmp = project_with_toolchain("shader_compiler = \"motive-no-such-glslang\"", "");
    fs::create_dir_all(tmp.path().join("shaders")).unwrap();
    fs::write(tmp.path().join("shaders/mesh.vert"), "#version 450\n").unwrap();

    run_in(tmp.path(), &["shaders"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing prerequisite"));
}

// ============================================================================
// motive-build features
// ============================================================================

#[test]
fn test_features_json_reports_forced_skip() {
    let tmp = project(
        r#"
[[feature]]
name = "vulkan"
flags = ["--enable-vulkan"]
skip = "headers too old"
probe = { kind = "packages", packages = ["vulkan"] }
"#,
    );

    let output = motive_build()
        .arg("--root")
        .arg(tmp.path())
        .args(["features", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let vulkan = &report["features"][0];
    assert_eq!(vulkan["name"], "vulkan");
    assert_eq!(vulkan["status"], "skipped");
    assert_eq!(vulkan["reason"], "headers too old");
    assert_eq!(vulkan["flags"], serde_json::json!([]));
}

// ============================================================================
// motive-build bootstrap
// ============================================================================

#[test]
fn test_bootstrap_manual_dependency_missing_gives_remediation() {
    let tmp = project(
        r#"
[[dependency]]
name = "glm"
repo = "https://github.com/g-truc/glm.git"
path = "glm"
fetch = "manual"
"#,
    );

    run_in(tmp.path(), &["bootstrap"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("glm is missing"))
        .stderr(predicate::str::contains("git submodule update --init --recursive"));
}
