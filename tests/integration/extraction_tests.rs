//! Extraction integration tests
//!
//! Java sources go through discovery, parsing, resolution and the
//! extraction engine; the assertions look at the written archive and
//! keep rules.

use annotextract::api::ApiDatabase;
use annotextract::config::Config;
use annotextract::discovery::FileFinder;
use annotextract::extract::{ExtractOptions, Extractor};
use annotextract::facts::TypedefFacts;
use annotextract::parser::{build_facts, JavaParser, ParsedUnit};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn parse_project() -> Vec<ParsedUnit> {
    let config = Config {
        sources: vec![PathBuf::from("src")],
        ..Default::default()
    };
    let files = FileFinder::new(&config).find_files(&fixtures_path().join("project"));
    assert_eq!(files.len(), 2, "fixture project should have two Java files");

    files
        .iter()
        .map(|file| {
            let source = file.read_contents().unwrap();
            JavaParser::new().parse(&file.path, &source).unwrap()
        })
        .collect()
}

fn extractor_for(units: &[ParsedUnit], api: Option<ApiDatabase>) -> Extractor {
    let (compilation_units, facts) = build_facts(units);
    let mut extractor = Extractor::new(ExtractOptions::default(), api, facts);
    extractor.extract_from_units(&compilation_units);
    extractor
}

fn parse_source(path: &str, source: &str) -> ParsedUnit {
    JavaParser::new().parse(Path::new(path), source).unwrap()
}

/// Read a zip entry as text
fn read_entry(zip: &Path, name: &str) -> Option<String> {
    let file = std::fs::File::open(zip).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).ok()?;
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    Some(contents)
}

// ============================================================================
// Full project
// ============================================================================

#[test]
fn test_project_archive_contents() {
    let units = parse_project();
    let mut extractor = extractor_for(&units, None);

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    let summary = extractor.export(Some(&zip), None).unwrap();

    assert!(summary.archive_written);
    assert_eq!(summary.packages, 2);
    assert!(summary.failed_packages.is_empty());

    let xml = read_entry(&zip, "pkg/annotations.xml").expect("pkg entry");
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n"));
    assert!(xml.contains(
        "  <item name=\"pkg.Foo void setMode(int) 0\">\n    <annotation name=\"android.support.annotation.IntDef\">\n      <val name=\"value\" val=\"{pkg.Foo.A, pkg.Foo.B}\" />\n    </annotation>\n  </item>\n"
    ));
    assert!(xml.contains(
        "  <item name=\"pkg.Foo java.lang.String getName(java.lang.String, int...)\">\n    <annotation name=\"android.support.annotation.Nullable\" />\n  </item>\n"
    ));
    assert!(xml.contains("<item name=\"pkg.Foo java.lang.String getName(java.lang.String, int...) 0\">"));
    assert!(xml.contains("<annotation name=\"android.support.annotation.NonNull\" />"));
    // The typedef declaration itself is not an annotated element
    assert!(!xml.contains("pkg.Foo.Mode"));

    let hw = read_entry(&zip, "pkg/hw/annotations.xml").expect("pkg.hw entry");
    assert!(hw.contains("<item name=\"pkg.hw.Camera void open(int)\">"));
    assert!(hw.contains("android.permission.CAMERA"));
    assert!(hw.contains(
        "    <annotation name=\"android.support.annotation.IntRange\">\n      <val name=\"from\" val=\"0\" />\n      <val name=\"to\" val=\"10\" />\n    </annotation>\n"
    ));
    // Typedef used through a qualified name from another package
    assert!(hw.contains("<item name=\"pkg.hw.Camera void setMode(int) 0\">"));
    assert!(hw.contains("val=\"{pkg.Foo.A, pkg.Foo.B}\""));
    assert!(!hw.contains("close"));
}

#[test]
fn test_project_items_are_sorted_within_package() {
    let units = parse_project();
    let mut extractor = extractor_for(&units, None);

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    extractor.export(Some(&zip), None).unwrap();

    let xml = read_entry(&zip, "pkg/annotations.xml").unwrap();
    let get_name = xml.find("getName(java.lang.String, int...)\"").unwrap();
    let get_name_param = xml.find("getName(java.lang.String, int...) 0").unwrap();
    let set_mode = xml.find("void setMode(int) 0").unwrap();
    assert!(get_name < get_name_param);
    assert!(get_name_param < set_mode);
}

#[test]
fn test_project_keep_rules() {
    let units = parse_project();
    let mut extractor = extractor_for(&units, None);

    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("proguard.txt");
    let summary = extractor.export(None, Some(&rules)).unwrap();

    assert!(summary.keep_rules_written);
    assert_eq!(summary.keep_rules, 1);
    assert_eq!(
        std::fs::read_to_string(&rules).unwrap(),
        "-keep class pkg.Foo {\n    <init>()\n}\n\n"
    );
}

#[test]
fn test_project_stats() {
    let units = parse_project();
    let mut extractor = extractor_for(&units, None);

    let dir = tempfile::tempdir().unwrap();
    extractor.export(Some(&dir.path().join("a.zip")), None).unwrap();

    let stats = extractor.stats();
    assert_eq!(stats.annotations.get("android.support.annotation.Nullable"), Some(&1));
    assert_eq!(stats.annotations.get("android.support.annotation.NonNull"), Some(&1));
    assert_eq!(stats.annotations.get("android.support.annotation.IntDef"), Some(&1));
    assert_eq!(stats.packages, 2);
    assert!(stats.non_public_typedefs.is_empty());

    let json = dir.path().join("stats.json");
    stats.write_json(&json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(value["packages"], 2);
}

// ============================================================================
// API filtering
// ============================================================================

#[test]
fn test_api_filter_drops_unlisted_elements() {
    let units = parse_project();
    let api = ApiDatabase::from_files(&[fixtures_path().join("project/api.txt")]).unwrap();
    let mut extractor = extractor_for(&units, Some(api));

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    let rules = dir.path().join("proguard.txt");
    let summary = extractor.export(Some(&zip), Some(&rules)).unwrap();

    let xml = read_entry(&zip, "pkg/annotations.xml").unwrap();
    assert!(xml.contains("getName(java.lang.String, int...)"));
    assert!(!xml.contains("setMode"));

    let hw = read_entry(&zip, "pkg/hw/annotations.xml").unwrap();
    assert!(hw.contains("void open(int)"));
    assert!(!hw.contains("setMode"));

    // Keep rules are written for filtered elements as well
    assert_eq!(summary.keep_rules, 1);
    assert!(extractor.stats().filtered_count >= 2);
}

// ============================================================================
// Focused sources
// ============================================================================

#[test]
fn test_platform_annotations_are_translated() {
    let unit = parse_source(
        "src/android/widget/Text.java",
        r#"
package android.widget;

import android.annotation.NonNull;
import android.annotation.Nullable;

public class Text {
    @Nullable
    public CharSequence hint;

    public void setText(@NonNull CharSequence text) {
    }
}
"#,
    );
    let mut extractor = extractor_for(&[unit], None);

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    extractor.export(Some(&zip), None).unwrap();

    let xml = read_entry(&zip, "android/widget/annotations.xml").unwrap();
    assert!(xml.contains(
        "  <item name=\"android.widget.Text hint\">\n    <annotation name=\"android.support.annotation.Nullable\" />\n"
    ));
    assert!(xml.contains(
        "  <item name=\"android.widget.Text void setText(java.lang.CharSequence) 0\">\n    <annotation name=\"android.support.annotation.NonNull\" />\n"
    ));
}

#[test]
fn test_generic_and_varargs_signatures() {
    let unit = parse_source(
        "src/pkg/Box.java",
        r#"
package pkg;

import android.support.annotation.NonNull;
import java.util.List;
import java.util.Map;

public class Box<T> {
    @NonNull
    public Map<String, List<T>> group(T... values) {
        return null;
    }
}
"#,
    );
    let mut extractor = extractor_for(&[unit], None);

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    extractor.export(Some(&zip), None).unwrap();

    let xml = read_entry(&zip, "pkg/annotations.xml").unwrap();
    assert!(xml.contains(
        "<item name=\"pkg.Box java.util.Map&lt;java.lang.String,java.util.List&lt;T&gt;&gt; group(T...)\">"
    ));
}

#[test]
fn test_class_retention_can_be_skipped() {
    let source = r#"
package pkg;

import android.support.annotation.UiThread;

@UiThread
public class Ui {
}
"#;
    let units = vec![parse_source("src/pkg/Ui.java", source)];

    let (compilation_units, facts) = build_facts(&units);
    let options = ExtractOptions {
        include_class_retention: false,
        ..Default::default()
    };
    let mut strict = Extractor::new(options, None, facts);
    strict.extract_from_units(&compilation_units);
    assert!(strict.store().is_empty());

    let lenient = extractor_for(&units, None);
    assert_eq!(lenient.store().len(), 1);
}

#[test]
fn test_non_public_typedef_is_reported() {
    let unit = parse_source(
        "src/pkg/Modes.java",
        r#"
package pkg;

import android.support.annotation.StringDef;
import java.lang.annotation.Retention;
import java.lang.annotation.RetentionPolicy;

public class Modes {
    public static final String FAST = "fast";

    @Retention(RetentionPolicy.SOURCE)
    @StringDef({FAST})
    @interface Speed {}

    public void go(@Speed String speed) {
    }
}
"#,
    );
    let mut extractor = extractor_for(&[unit], None);
    assert_eq!(extractor.non_public_typedefs(), &["pkg.Modes.Speed".to_string()]);

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    extractor.export(Some(&zip), None).unwrap();
    let xml = read_entry(&zip, "pkg/annotations.xml").unwrap();
    assert!(xml.contains("<annotation name=\"android.support.annotation.StringDef\">"));
    assert!(xml.contains("val=\"{pkg.Modes.FAST}\""));
}

#[test]
fn test_keep_on_fields_and_methods() {
    let unit = parse_source(
        "src/pkg/Kept.java",
        r#"
package pkg;

import android.support.annotation.Keep;

public interface Kept {
    @Keep
    int LIMIT = 3;

    @Keep
    String describe(int level);
}
"#,
    );
    let mut extractor = extractor_for(&[unit], None);

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    let rules = dir.path().join("rules/proguard.txt");
    let summary = extractor.export(Some(&zip), Some(&rules)).unwrap();

    // Only keep markers: nothing to archive
    assert!(!summary.archive_written);
    assert!(!zip.exists());
    assert_eq!(summary.keep_rules, 2);
    assert_eq!(
        std::fs::read_to_string(&rules).unwrap(),
        "-keep interface pkg.Kept {\n    int LIMIT\n}\n\n-keep interface pkg.Kept {\n    java.lang.String describe(int)\n}\n\n"
    );
}

#[test]
fn test_empty_source_set_writes_nothing() {
    let mut extractor = Extractor::new(ExtractOptions::default(), None, TypedefFacts::default());
    extractor.extract_from_units(&[]);

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    let summary = extractor.export(Some(&zip), None).unwrap();
    assert!(!summary.archive_written);
    assert!(!zip.exists());
    assert_eq!(extractor.stats().total(), 0);
}
