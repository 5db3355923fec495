//! End-to-end tests for the deplookup CLI
//!
//! These tests verify:
//! - Text and JSON output for fixture-backed lookups
//! - Settings files and CLI overrides reach the engine
//! - Exit codes are correct for various scenarios

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURES: &str = r#"{
  "npm": {
    "packages": {
      "lib": {
        "releases": [
          { "version": "1.0.0" },
          { "version": "1.1.0", "releaseTimestamp": "2020-01-01T00:00:00Z" },
          { "version": "1.2.0", "releaseTimestamp": "2099-01-01T00:00:00Z" },
          { "version": "2.0.0", "releaseTimestamp": "2099-01-01T00:00:00Z" }
        ],
        "tags": { "latest": "2.0.0" }
      },
      "stable": {
        "releases": [{ "version": "3.0.0" }]
      }
    },
    "failing": ["flaky"]
  }
}"#;

/// Create a test directory with a fixture file and the given dependency list
fn create_test_project(deps: &str) -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    fs::write(temp_dir.path().join("releases.json"), FIXTURES).unwrap();
    fs::write(temp_dir.path().join("deps.json"), deps).unwrap();
    temp_dir
}

fn path_arg(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

/// Command running from inside `dir` against its fixture file
fn deplookup(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("deplookup").unwrap();
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg(path_arg(dir, "deps.json"))
        .arg("--releases")
        .arg(path_arg(dir, "releases.json"));
    cmd
}

const LIB_DEPS: &str = r#"[
  { "depName": "lib", "datasource": "npm", "currentValue": "^1.0.0" },
  { "depName": "stable", "datasource": "npm", "currentValue": "^3.0.0" }
]"#;

mod text_output_tests {
    use super::*;

    /// Test that updates and the summary are printed
    #[test]
    fn test_text_output_lists_updates() {
        let project = create_test_project(LIB_DEPS);

        deplookup(project.path())
            .arg("--quiet")
            .assert()
            .success()
            .stdout(predicate::str::contains("lib (npm)"))
            .stdout(predicate::str::contains("^1.2.0"))
            .stdout(predicate::str::contains("^2.0.0"))
            .stdout(predicate::str::contains("2 updates, 0 skipped, 0 failed"));
    }

    /// Test that up-to-date dependencies only show in verbose mode
    #[test]
    fn test_verbose_lists_up_to_date() {
        let project = create_test_project(LIB_DEPS);

        deplookup(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("stable (npm)").not());

        deplookup(project.path())
            .arg("--verbose")
            .assert()
            .success()
            .stdout(predicate::str::contains("stable (npm)"))
            .stdout(predicate::str::contains("up to date"));
    }

    /// Test that an empty dependency list is reported
    #[test]
    fn test_empty_dependency_list() {
        let project = create_test_project("[]");

        deplookup(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("No dependencies to look up"));
    }
}

mod json_output_tests {
    use super::*;

    fn run_json(project: &TempDir, extra: &[&str]) -> serde_json::Value {
        let output = deplookup(project.path())
            .arg("--json")
            .args(extra)
            .output()
            .expect("Failed to execute command");
        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        serde_json::from_slice(&output.stdout).expect("Output should be valid JSON")
    }

    /// Test JSON output structure
    #[test]
    fn test_json_output_schema() {
        let project = create_test_project(LIB_DEPS);
        let json = run_json(&project, &[]);

        assert_eq!(json["summary"]["dependencies"], 2);
        assert_eq!(json["summary"]["updates"], 2);
        assert_eq!(json["summary"]["failed"], 0);

        let deps = json["dependencies"].as_array().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0]["depName"], "lib");
        assert_eq!(deps[0]["currentValue"], "^1.0.0");

        let result = &deps[0]["result"];
        assert_eq!(result["currentVersion"], "1.0.0");
        assert_eq!(result["updates"][0]["updateType"], "minor");
        assert_eq!(result["updates"][0]["newValue"], "^1.2.0");
        assert_eq!(result["updates"][1]["updateType"], "major");
        assert_eq!(result["updates"][1]["newValue"], "^2.0.0");
    }

    /// Test that skip reasons are reported
    #[test]
    fn test_json_skip_reason() {
        let project = create_test_project(
            r#"[{ "depName": "lib", "datasource": "npm", "currentValue": "1.0.0" }]"#,
        );
        let json = run_json(&project, &[]);

        assert_eq!(json["summary"]["skipped"], 1);
        assert_eq!(json["dependencies"][0]["result"]["skipReason"], "is-pinned");
    }

    /// Test that the age filter holds back releases that are too young
    #[test]
    fn test_json_age_flag() {
        let project = create_test_project(LIB_DEPS);
        let json = run_json(&project, &["--age", "3d"]);

        let updates = json["dependencies"][0]["result"]["updates"]
            .as_array()
            .unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0]["newVersion"], "1.1.0");
        assert_eq!(updates[0]["pendingVersions"][0], "1.2.0");
        assert!(updates[0].get("pendingChecks").is_none());
        assert_eq!(updates[1]["newVersion"], "2.0.0");
        assert_eq!(updates[1]["pendingChecks"], true);
    }

    /// Test that a settings file is picked up from the working directory
    #[test]
    fn test_settings_file_discovery() {
        let project = create_test_project(LIB_DEPS);
        fs::write(
            project.path().join("deplookup.toml"),
            r#"
[[packageRules]]
matchPackageNames = ["lib"]
allowedVersions = "<1.2.0"
"#,
        )
        .unwrap();
        let json = run_json(&project, &[]);

        let updates = json["dependencies"][0]["result"]["updates"]
            .as_array()
            .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0]["newVersion"], "1.1.0");
    }

    /// Test that an explicit settings file wins over discovery
    #[test]
    fn test_explicit_settings_file() {
        let project = create_test_project(LIB_DEPS);
        let custom = project.path().join("custom.toml");
        fs::write(
            &custom,
            r#"
[defaults]
separateMajorMinor = false
"#,
        )
        .unwrap();
        let json = run_json(&project, &["--config", custom.to_str().unwrap()]);

        let updates = json["dependencies"][0]["result"]["updates"]
            .as_array()
            .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0]["newVersion"], "2.0.0");
    }
}

mod exit_code_tests {
    use super::*;

    /// Test exit code with help flag
    #[test]
    fn test_exit_code_help() {
        Command::cargo_bin("deplookup")
            .unwrap()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("deplookup"));
    }

    /// Test exit code with version flag
    #[test]
    fn test_exit_code_version() {
        Command::cargo_bin("deplookup")
            .unwrap()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    /// Test exit code with a missing dependency file
    #[test]
    fn test_exit_code_missing_deps_file() {
        let project = tempfile::tempdir().unwrap();

        Command::cargo_bin("deplookup")
            .unwrap()
            .current_dir(project.path())
            .arg("does-not-exist.json")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"));
    }

    /// Test exit code with a malformed dependency file
    #[test]
    fn test_exit_code_malformed_deps_file() {
        let project = create_test_project("{ not json");

        deplookup(project.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"));
    }

    /// Test that a registry failure is partial success
    #[test]
    fn test_exit_code_registry_failure() {
        let project = create_test_project(
            r#"[
  { "depName": "lib", "datasource": "npm", "currentValue": "^1.0.0" },
  { "depName": "flaky", "datasource": "npm", "currentValue": "^1.0.0" }
]"#,
        );

        deplookup(project.path())
            .arg("--quiet")
            .assert()
            .code(2)
            .stdout(predicate::str::contains("flaky (lookup failed"))
            .stdout(predicate::str::contains("^1.2.0"));
    }

    /// Test that invalid configuration aborts the run
    #[test]
    fn test_exit_code_invalid_config() {
        let project = create_test_project(
            r#"[{ "depName": "lib", "datasource": "npm", "currentValue": "^1.0.0", "versioning": "maven" }]"#,
        );

        deplookup(project.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid configuration for lib"));
    }

    /// Test that an invalid settings file is a fatal error
    #[test]
    fn test_exit_code_invalid_settings() {
        let project = create_test_project(LIB_DEPS);
        fs::write(
            project.path().join("deplookup.toml"),
            "[defaults]\nminimumReleaseAge = \"soon\"\n",
        )
        .unwrap();

        deplookup(project.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"));
    }

    /// Test that an invalid age is rejected by argument parsing
    #[test]
    fn test_exit_code_invalid_age() {
        let project = create_test_project(LIB_DEPS);

        deplookup(project.path())
            .args(["--age", "10x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--age"));
    }
}
