//! CLI integration tests
//!
//! These tests verify that the CLI works correctly with various options.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn annotextract() -> Command {
    Command::cargo_bin("annotextract").unwrap()
}

fn entry_names(zip: &Path) -> Vec<String> {
    let file = fs::File::open(zip).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|index| archive.by_index(index).unwrap().name().to_string())
        .collect()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help() {
    annotextract()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--proguard"))
        .stdout(predicate::str::contains("--api-filter"));
}

#[test]
fn test_version() {
    annotextract()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_output_is_a_usage_error() {
    annotextract()
        .arg(fixtures_path().join("project"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Nothing to write"));
}

// ============================================================================
// Extraction runs
// ============================================================================

#[test]
fn test_full_run_writes_archive_and_keep_rules() {
    let out = tempfile::tempdir().unwrap();
    let zip = out.path().join("annotations.zip");
    let rules = out.path().join("proguard.txt");

    annotextract()
        .arg(fixtures_path().join("project"))
        .args(["--sources", "src"])
        .arg("--output")
        .arg(&zip)
        .arg("--proguard")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted"))
        .stdout(predicate::str::contains("in 2 packages, 1 keep rules"));

    assert_eq!(entry_names(&zip), vec!["pkg/annotations.xml", "pkg/hw/annotations.xml"]);
    assert_eq!(
        fs::read_to_string(&rules).unwrap(),
        "-keep class pkg.Foo {\n    <init>()\n}\n\n"
    );
}

#[test]
fn test_api_filter_and_stats_json() {
    let out = tempfile::tempdir().unwrap();
    let zip = out.path().join("annotations.zip");
    let stats = out.path().join("stats.json");
    let project = fixtures_path().join("project");

    annotextract()
        .arg(&project)
        .arg("--output")
        .arg(&zip)
        .arg("--api-filter")
        .arg(project.join("api.txt"))
        .arg("--stats-json")
        .arg(&stats)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&stats).unwrap()).unwrap();
    assert_eq!(value["filtered_count"], 2);
    assert_eq!(value["packages"], 2);

    let file = fs::File::open(&zip).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut xml = String::new();
    archive
        .by_name("pkg/annotations.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    assert!(!xml.contains("setMode"));
}

#[test]
fn test_merge_option() {
    let out = tempfile::tempdir().unwrap();
    let zip = out.path().join("annotations.zip");
    let stats = out.path().join("stats.json");

    annotextract()
        .arg(fixtures_path().join("project"))
        .arg("--output")
        .arg(&zip)
        .arg("--merge")
        .arg(fixtures_path().join("merge"))
        .arg("--stats-json")
        .arg(&stats)
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&stats).unwrap()).unwrap();
    assert_eq!(value["merged_count"], 1);
}

#[test]
fn test_config_file() {
    let project = tempfile::tempdir().unwrap();
    let src = project.path().join("java/pkg");
    fs::create_dir_all(&src).unwrap();
    fs::copy(
        fixtures_path().join("project/src/pkg/Foo.java"),
        src.join("Foo.java"),
    )
    .unwrap();

    let zip = project.path().join("build/annotations.zip");
    fs::write(
        project.path().join("annotextract.yml"),
        format!("sources: [java]\noutput: {}\n", zip.display()),
    )
    .unwrap();

    annotextract().arg(project.path()).assert().success();
    assert_eq!(entry_names(&zip), vec!["pkg/annotations.xml"]);
}

// ============================================================================
// Error handling
// ============================================================================

#[test]
fn test_syntax_errors_fail_without_allow_errors() {
    let project = tempfile::tempdir().unwrap();
    fs::write(project.path().join("Broken.java"), "package p; public class Broken {").unwrap();
    let zip = project.path().join("out/annotations.zip");

    annotextract()
        .arg(project.path())
        .arg("--output")
        .arg(&zip)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--allow-errors"));
    assert!(!zip.exists());

    annotextract()
        .arg(project.path())
        .arg("--output")
        .arg(&zip)
        .arg("--allow-errors")
        .assert()
        .success()
        .stderr(predicate::str::contains("Syntax errors"));
}

#[test]
fn test_invalid_config_file() {
    let project = tempfile::tempdir().unwrap();
    let config = project.path().join("bad.yml");
    fs::write(&config, "sources: [").unwrap();

    annotextract()
        .arg(project.path())
        .arg("--config")
        .arg(&config)
        .args(["--output", "unused.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.yml"));
}
