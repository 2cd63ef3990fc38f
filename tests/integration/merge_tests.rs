//! Merge integration tests
//!
//! Previously exported annotations are read back from XML files,
//! directories and archives and folded into an extraction.

use annotextract::api::ApiDatabase;
use annotextract::extract::{ExtractOptions, Extractor};
use annotextract::facts::TypedefFacts;
use annotextract::model::ItemKey;
use annotextract::parser::{build_facts, JavaParser, ParsedUnit};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn project_units() -> Vec<ParsedUnit> {
    ["src/pkg/Foo.java", "src/pkg/hw/Camera.java"]
        .iter()
        .map(|relative| {
            let path = fixtures_path().join("project").join(relative);
            let source = fs::read_to_string(&path).unwrap();
            JavaParser::new().parse(&path, &source).unwrap()
        })
        .collect()
}

fn project_extractor(api: Option<ApiDatabase>) -> Extractor {
    let (units, facts) = build_facts(&project_units());
    let mut extractor = Extractor::new(ExtractOptions::default(), api, facts);
    extractor.extract_from_units(&units);
    extractor
}

fn empty_extractor(api: Option<ApiDatabase>) -> Extractor {
    Extractor::new(ExtractOptions::default(), api, TypedefFacts::default())
}

/// All entries of an archive as (name, contents), in archive order
fn archive_entries(zip: &Path) -> Vec<(String, String)> {
    let file = fs::File::open(zip).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|index| {
            let mut entry = archive.by_index(index).unwrap();
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            (entry.name().to_string(), contents)
        })
        .collect()
}

fn method_key(class: &str, name: &str, parameters: &str) -> ItemKey {
    ItemKey::Method {
        class: class.into(),
        name: name.into(),
        parameters: parameters.into(),
        is_constructor: false,
    }
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_export_then_merge_reproduces_archive() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.zip");
    let second = dir.path().join("second.zip");

    let mut extractor = project_extractor(None);
    extractor.export(Some(&first), None).unwrap();

    let mut reimport = empty_extractor(None);
    let merged = reimport.merge_existing(&first);
    assert!(merged > 0);
    reimport.export(Some(&second), None).unwrap();

    assert_eq!(archive_entries(&first), archive_entries(&second));
}

#[test]
fn test_merging_own_output_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");

    let mut extractor = project_extractor(None);
    extractor.export(Some(&zip), None).unwrap();

    let mut again = project_extractor(None);
    assert_eq!(again.merge_existing(&zip), 0);
    assert_eq!(again.stats().merged_count, 0);
}

// ============================================================================
// Conflicts and skips
// ============================================================================

#[test]
fn test_merge_fixture_document() {
    let mut extractor = project_extractor(None);
    let merged = extractor.merge_existing(&fixtures_path().join("merge/annotations.xml"));

    // Only the @UiThread on Camera.close() is new: the @NonNull contradicts
    // the extracted @Nullable, @NonNls is never imported and Calendar.set
    // parameters past the first are skipped
    assert_eq!(merged, 1);

    let store = extractor.store();
    let get_name = store
        .find("pkg.Foo", &method_key("pkg.Foo", "getName", "java.lang.String,int..."))
        .unwrap();
    let names: Vec<&str> = get_name.annotations.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["android.support.annotation.Nullable"]);

    let close = store
        .find("pkg.hw.Camera", &method_key("pkg.hw.Camera", "close", ""))
        .unwrap();
    assert_eq!(close.annotations[0].name, "android.support.annotation.UiThread");

    assert!(store.snapshot().iter().all(|package| package.package != "java.util"));
}

#[test]
fn test_merge_directory_and_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();
    fs::copy(fixtures_path().join("merge/annotations.xml"), nested.join("annotations.xml")).unwrap();
    fs::write(nested.join("README.txt"), "not an annotation file").unwrap();

    let mut extractor = empty_extractor(None);
    // Without extracted items nothing conflicts with the @NonNull
    assert_eq!(extractor.merge_existing(dir.path()), 2);
    assert_eq!(extractor.merge_existing(&dir.path().join("missing")), 0);
}

#[test]
fn test_broken_document_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.xml");
    fs::write(&broken, "<root><item name=\"pkg.Foo void f()\"><annotation").unwrap();

    let mut extractor = empty_extractor(None);
    assert_eq!(extractor.merge_existing(&broken), 0);
    assert!(extractor.store().is_empty());
}

// ============================================================================
// API filtering
// ============================================================================

#[test]
fn test_merge_respects_api_filter() {
    let api = ApiDatabase::from_files(&[fixtures_path().join("project/api.txt")]).unwrap();
    let mut extractor = empty_extractor(Some(api));

    let dir = tempfile::tempdir().unwrap();
    let xml = dir.path().join("annotations.xml");
    fs::write(
        &xml,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <item name="pkg.Foo void setMode(int) 0">
    <annotation name="android.support.annotation.IntDef">
      <val name="value" val="{pkg.Foo.A, pkg.Foo.B}" />
    </annotation>
  </item>
  <item name="pkg.hw.Camera void open(int) 0">
    <annotation name="org.intellij.lang.annotations.MagicConstant">
      <val name="intValues" val="{pkg.Foo.A, pkg.Foo.C, 7}" />
    </annotation>
  </item>
</root>
"#,
    )
    .unwrap();

    assert_eq!(extractor.merge_existing(&xml), 1);
    assert_eq!(extractor.stats().filtered_count, 1);

    let zip = dir.path().join("annotations.zip");
    extractor.export(Some(&zip), None).unwrap();
    let entries = archive_entries(&zip);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "pkg/hw/annotations.xml");
    assert!(entries[0].1.contains(
        "  <item name=\"pkg.hw.Camera void open(int) 0\">\n    <annotation name=\"android.support.annotation.IntDef\">\n      <val name=\"value\" val=\"{pkg.Foo.A, 7}\" />\n"
    ));
}

#[test]
fn test_values_from_class_uses_source_declaration_order() {
    let units = vec![JavaParser::new()
        .parse(
            Path::new("src/pkg/Gravity.java"),
            "package pkg; public class Gravity { public static final int TOP = 1; public static final int BOTTOM = 2; public static final int CENTER = 4; }",
        )
        .unwrap()];
    let (compilation_units, facts) = build_facts(&units);
    let mut extractor = Extractor::new(ExtractOptions::default(), None, facts);
    extractor.extract_from_units(&compilation_units);

    let dir = tempfile::tempdir().unwrap();
    let xml = dir.path().join("annotations.xml");
    fs::write(
        &xml,
        r#"<root>
  <item name="pkg.View void setGravity(int) 0">
    <annotation name="org.intellij.lang.annotations.MagicConstant">
      <val name="flagsFromClass" val="pkg.Gravity.class" />
    </annotation>
  </item>
</root>"#,
    )
    .unwrap();
    assert_eq!(extractor.merge_existing(&xml), 1);

    let zip = dir.path().join("annotations.zip");
    extractor.export(Some(&zip), None).unwrap();
    let entries = archive_entries(&zip);
    assert!(entries[0].1.contains(
        "<val name=\"value\" val=\"{pkg.Gravity.TOP, pkg.Gravity.BOTTOM, pkg.Gravity.CENTER}\" />\n      <val name=\"flag\" val=\"true\" />"
    ));
}

// ============================================================================
// Export of imported annotations
// ============================================================================

#[test]
fn test_unwritable_package_is_skipped_alone() {
    let dir = tempfile::tempdir().unwrap();
    let xml = dir.path().join("annotations.xml");
    fs::write(
        &xml,
        r#"<root>
  <item name="bad.Foo X">
    <annotation name="android.support.annotation.Odd&quot;Name" />
  </item>
  <item name="good.Bar Y">
    <annotation name="android.support.annotation.IntRange">
      <val name="a&quot;b" val="1" />
    </annotation>
  </item>
</root>"#,
    )
    .unwrap();

    let mut extractor = empty_extractor(None);
    assert_eq!(extractor.merge_existing(&xml), 2);

    let zip = dir.path().join("annotations.zip");
    let summary = extractor.export(Some(&zip), None).unwrap();
    assert_eq!(summary.failed_packages, vec!["bad"]);
    assert_eq!(summary.packages, 1);
    assert!(summary.archive_written);

    let entries = archive_entries(&zip);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "good/annotations.xml");
    assert!(entries[0]
        .1
        .contains("<val name=\"a&quot;b\" val=\"1\" />"));
}
