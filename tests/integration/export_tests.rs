//! Export integration tests
//!
//! Archive layout, stale output handling and keep rules files.

use annotextract::export::{entry_name, write_archive, write_package_document, RenderOptions};
use annotextract::extract::{ExtractOptions, Extractor, ItemStore};
use annotextract::facts::{AnnotationValue, CompilationUnit, SourceAnnotation, TypeDecl, TypedefFacts};
use annotextract::model::{AnnotationData, ClassKind, Item, MethodSignature};
use annotextract::proguard::write_keep_rules;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

fn entry_names(zip: &Path) -> Vec<String> {
    let file = fs::File::open(zip).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|index| archive.by_index(index).unwrap().name().to_string())
        .collect()
}

fn read_entry(zip: &Path, name: &str) -> String {
    let file = fs::File::open(zip).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    contents
}

fn annotated_method(class: &str, name: &str, annotation: &str) -> Item {
    let method = MethodSignature::new(name, "", Some("void".into()), false);
    let mut item = Item::method(class, ClassKind::Class, method);
    item.annotations.push(AnnotationData::new(annotation));
    item
}

fn store_with(items: Vec<Item>) -> ItemStore {
    let mut store = ItemStore::new(None, false);
    for item in items {
        store.add(item);
    }
    store
}

// ============================================================================
// Archive layout
// ============================================================================

#[test]
fn test_one_entry_per_package_in_name_order() {
    let store = store_with(vec![
        annotated_method("com.b.Widget", "draw", "android.support.annotation.UiThread"),
        annotated_method("com.a.Model", "load", "android.support.annotation.WorkerThread"),
        annotated_method("com.a.inner.Deep", "run", "android.support.annotation.MainThread"),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("out/nested/annotations.zip");
    let summary = write_archive(&zip, &store, &RenderOptions::default()).unwrap();

    assert!(summary.archive_written);
    assert_eq!(summary.packages, 3);
    assert_eq!(summary.items, 3);
    assert_eq!(
        entry_names(&zip),
        vec![
            "com/a/annotations.xml",
            "com/a/inner/annotations.xml",
            "com/b/annotations.xml",
        ]
    );
    assert_eq!(
        read_entry(&zip, "com/b/annotations.xml"),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n  <item name=\"com.b.Widget void draw()\">\n    <annotation name=\"android.support.annotation.UiThread\" />\n  </item>\n</root>\n\n"
    );
}

#[test]
fn test_default_package_entry() {
    assert_eq!(entry_name(""), "annotations.xml");
    assert_eq!(entry_name("android.widget"), "android/widget/annotations.xml");
}

#[test]
fn test_inner_classes_share_the_package_entry() {
    let store = store_with(vec![
        annotated_method("pkg.Outer.Inner", "b", "android.support.annotation.UiThread"),
        annotated_method("pkg.Outer", "a", "android.support.annotation.UiThread"),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    write_archive(&zip, &store, &RenderOptions::default()).unwrap();

    assert_eq!(entry_names(&zip), vec!["pkg/annotations.xml"]);
    let xml = read_entry(&zip, "pkg/annotations.xml");
    let outer = xml.find("pkg.Outer void a()").unwrap();
    let inner = xml.find("pkg.Outer.Inner void b()").unwrap();
    assert!(outer < inner);
}

#[test]
fn test_attribute_values_are_escaped_once() {
    let mut item = annotated_method("pkg.Perm", "call", "android.support.annotation.RequiresPermission");
    item.annotations[0] = AnnotationData::with_source(
        "android.support.annotation.RequiresPermission",
        vec![annotextract::facts::SourceAttribute {
            name: None,
            value: AnnotationValue::Str("a&b<c>".into()),
        }],
    );

    let xml = write_package_document(&[&item], &RenderOptions::default());
    assert!(xml.contains("<val name=\"value\" val=\"&quot;a&amp;b&lt;c&gt;&quot;\" />"));
}

// ============================================================================
// Stale outputs
// ============================================================================

#[test]
fn test_stale_archive_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("annotations.zip");
    fs::write(&zip, "stale").unwrap();

    let summary = write_archive(&zip, &ItemStore::new(None, false), &RenderOptions::default()).unwrap();
    assert!(!summary.archive_written);
    assert!(!zip.exists());
}

#[test]
fn test_stale_keep_rules_are_removed() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("proguard.txt");
    fs::write(&rules, "-keep class Old\n").unwrap();

    assert_eq!(write_keep_rules(&rules, &[]).unwrap(), 0);
    assert!(!rules.exists());
}

// ============================================================================
// Keep rules through the extractor
// ============================================================================

#[test]
fn test_keep_rules_are_sorted_and_separated() {
    let mut widget = TypeDecl::new("pkg.Widget", ClassKind::Class);
    widget.annotations.push(SourceAnnotation::new("android.support.annotation.Keep"));
    let mut api = TypeDecl::new("pkg.Api", ClassKind::Interface);
    api.annotations.push(SourceAnnotation::new("android.support.annotation.Keep"));
    let mut color = TypeDecl::new("pkg.Color", ClassKind::Enum);
    color.annotations.push(SourceAnnotation::new("android.support.annotation.Keep"));

    let unit = CompilationUnit {
        path: PathBuf::from("pkg/Widget.java"),
        types: vec![widget, api, color],
    };

    let mut extractor = Extractor::new(ExtractOptions::default(), None, TypedefFacts::default());
    extractor.extract_from_units(&[unit]);

    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("proguard.txt");
    let zip = dir.path().join("annotations.zip");
    let summary = extractor.export(Some(&zip), Some(&rules)).unwrap();

    assert_eq!(summary.keep_rules, 3);
    assert!(!summary.archive_written);
    assert_eq!(
        fs::read_to_string(&rules).unwrap(),
        "-keep interface pkg.Api\n\n-keep enum pkg.Color\n\n-keep class pkg.Widget\n\n"
    );
}

#[test]
fn test_keep_item_with_other_annotations_leaves_archive() {
    let mut widget = TypeDecl::new("pkg.Widget", ClassKind::Class);
    widget.annotations.push(SourceAnnotation::new("android.support.annotation.Keep"));
    widget.annotations.push(SourceAnnotation::new("android.support.annotation.UiThread"));
    let mut other = TypeDecl::new("pkg.Other", ClassKind::Class);
    other.annotations.push(SourceAnnotation::new("android.support.annotation.UiThread"));

    let unit = CompilationUnit {
        path: PathBuf::from("pkg/Widget.java"),
        types: vec![widget, other],
    };

    let mut extractor = Extractor::new(ExtractOptions::default(), None, TypedefFacts::default());
    extractor.extract_from_units(&[unit]);

    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("proguard.txt");
    let zip = dir.path().join("annotations.zip");
    let summary = extractor.export(Some(&zip), Some(&rules)).unwrap();

    assert_eq!(summary.keep_rules, 1);
    assert!(summary.archive_written);
    assert_eq!(summary.items, 1);
    assert_eq!(fs::read_to_string(&rules).unwrap(), "-keep class pkg.Widget\n\n");
    let xml = read_entry(&zip, "pkg/annotations.xml");
    assert!(xml.contains("<item name=\"pkg.Other\">"));
    assert!(!xml.contains("pkg.Widget"));
}
