// The extraction engine
//
// Walks declaration facts, classifies their annotations into items, merges
// imported annotations and writes the results.

use super::classifier::AnnotationClassifier;
use super::merge::{fix_parameter_string, MergeEngine};
use super::stats::ExtractionStats;
use super::store::ItemStore;
use super::typedefs::TypedefResolver;
use crate::api::{raw_class, raw_method, ApiDatabase};
use crate::export::{write_archive, ExportError, ExportSummary, RenderOptions};
use crate::facts::{
    walk_unit, CompilationUnit, DeclarationVisitor, FieldDecl, MethodDecl, ParameterDecl, TypeDecl, TypedefFacts,
};
use crate::model::{ClassKind, Item, ItemKind, MethodSignature, NamespaceMap};
use crate::proguard::write_keep_rules;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Return-value annotations of this method are never recorded
const FIND_VIEW_BY_ID: &str = "findViewById";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Also record support annotations with class retention
    pub include_class_retention: bool,
    /// Write the `value` attribute first
    pub sort_annotations: bool,
    /// Log elements and constants rejected by the API filter
    pub list_filtered: bool,
    /// Log extraction statistics after writing the archive
    pub display_info: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_class_retention: true,
            sort_annotations: true,
            list_filtered: true,
            display_info: true,
        }
    }
}

pub struct Extractor {
    options: ExtractOptions,
    api: Option<Arc<ApiDatabase>>,
    facts: Arc<TypedefFacts>,
    classifier: AnnotationClassifier,
    store: ItemStore,
    merge: MergeEngine,
    processed: HashSet<PathBuf>,
    exported: Option<ExportSummary>,
}

impl Extractor {
    pub fn new(options: ExtractOptions, api: Option<ApiDatabase>, facts: TypedefFacts) -> Self {
        Self::with_namespaces(options, api, facts, NamespaceMap::default())
    }

    pub fn with_namespaces(
        mut options: ExtractOptions,
        api: Option<ApiDatabase>,
        facts: TypedefFacts,
        names: NamespaceMap,
    ) -> Self {
        // Filter listings only make sense with a filter
        options.list_filtered = options.list_filtered && api.is_some();

        let api = api.map(Arc::new);
        let facts = Arc::new(facts);
        let classifier = AnnotationClassifier::new(
            names,
            TypedefResolver::new(facts.clone()),
            options.include_class_retention,
        );
        let store = ItemStore::new(api.clone(), options.list_filtered);
        let merge = MergeEngine::new(api.clone(), facts.clone(), options.list_filtered);

        Self {
            options,
            api,
            facts,
            classifier,
            store,
            merge,
            processed: HashSet::new(),
            exported: None,
        }
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Typedef annotation types that are not public
    pub fn non_public_typedefs(&self) -> &[String] {
        &self.facts.non_public_typedefs
    }

    pub fn extract_from_units(&mut self, units: &[CompilationUnit]) {
        for unit in units {
            self.analyze(unit);
        }
    }

    /// Extract the annotated items of one compilation unit. A unit is
    /// analyzed at most once.
    pub fn analyze(&mut self, unit: &CompilationUnit) {
        if !unit.path.as_os_str().is_empty() && !self.processed.insert(unit.path.clone()) {
            debug!("Skipping already processed {}", unit.path.display());
            return;
        }

        let items = walk_unit(self, unit);
        for item in items {
            self.submit(item);
        }
    }

    fn submit(&mut self, item: Item) {
        if matches!(item.kind, ItemKind::Method(_)) && item.method_name() == Some(FIND_VIEW_BY_ID) {
            let key = item.key();
            if self
                .store
                .find(&item.containing_class, &key)
                .is_some_and(|existing| existing.annotations.is_empty())
            {
                self.store.remove(&item.containing_class, &key);
            }
            return;
        }
        self.store.add(item);
    }

    /// Merge previously exported annotations from a file, archive or directory
    pub fn merge_existing(&mut self, path: &Path) -> usize {
        let added = self.merge.merge_path(path, &mut self.store);
        info!("Merged {} annotations from {}", added, path.display());
        added
    }

    /// Write the keep rules and the annotations archive. Keep items are
    /// always taken out of the store first.
    pub fn export(&mut self, annotations_zip: Option<&Path>, keep_rules: Option<&Path>) -> Result<ExportSummary, ExportError> {
        let keep_items = self.store.take_keep_items();

        let mut summary = ExportSummary::default();
        if let Some(path) = keep_rules {
            summary.keep_rules = write_keep_rules(path, &keep_items)?;
            summary.keep_rules_written = !keep_items.is_empty();
            if summary.keep_rules_written {
                info!("ProGuard keep rules written to {}", path.display());
            }
        }

        if let Some(path) = annotations_zip {
            let options = RenderOptions {
                sort_attributes: self.options.sort_annotations,
                api: self.api.as_deref(),
                list_filtered: self.options.list_filtered,
            };
            let written = write_archive(path, &self.store, &options)?;
            summary.archive_written = written.archive_written;
            summary.packages = written.packages;
            summary.items = written.items;
            summary.failed_packages = written.failed_packages;
        }

        self.exported = Some(summary.clone());
        if let (Some(path), true) = (annotations_zip, summary.archive_written) {
            self.write_stats();
            info!("Annotations written to {}", path.display());
        }

        Ok(summary)
    }

    pub fn stats(&self) -> ExtractionStats {
        let mut stats = ExtractionStats {
            annotations: self.classifier.stats().clone(),
            filtered_count: self.store.filtered_count(),
            merged_count: self.merge.merged_count(),
            items: self.store.len(),
            keep_rules: self.store.keep_items().len(),
            packages: self.store.snapshot().len(),
            failed_packages: Vec::new(),
            non_public_typedefs: self.facts.non_public_typedefs.clone(),
        };
        if let Some(summary) = &self.exported {
            stats.items = summary.items;
            stats.packages = summary.packages;
            stats.keep_rules = summary.keep_rules;
            stats.failed_packages = summary.failed_packages.clone();
        }
        stats
    }

    pub fn write_stats(&self) {
        if self.options.display_info {
            self.stats().log();
        }
    }

    fn method_signature(&self, class: &TypeDecl, method: &MethodDecl) -> MethodSignature {
        let name = if method.is_constructor {
            class.simple_name().to_string()
        } else {
            raw_method(&method.name).to_string()
        };
        let return_type = if method.is_constructor {
            Some(class.qualified_name.clone())
        } else {
            method.return_type.clone()
        };
        MethodSignature::new(name, parameter_list(&method.parameters), return_type, method.is_constructor)
    }
}

impl DeclarationVisitor for Extractor {
    fn skip_class(&mut self, class: &TypeDecl) -> bool {
        // Member typedef declarations are consumed through the typedef facts
        class.is_member && class.kind == ClassKind::Annotation && self.classifier.has_relevant(&class.annotations)
    }

    fn visit_class(&mut self, class: &TypeDecl) -> Option<Item> {
        if !self.classifier.has_relevant(&class.annotations) {
            return None;
        }
        let mut item = Item::class(raw_class(&class.qualified_name), class.kind);
        self.classifier.classify(&class.annotations, &mut item);
        Some(item)
    }

    fn visit_field(&mut self, class: &TypeDecl, field: &FieldDecl) -> Option<Item> {
        if !self.classifier.has_relevant(&field.annotations) {
            return None;
        }
        let mut item = Item::field(
            raw_class(&class.qualified_name),
            class.kind,
            &field.name,
            Some(field.type_name.clone()),
        );
        self.classifier.classify(&field.annotations, &mut item);
        Some(item)
    }

    fn visit_method(&mut self, class: &TypeDecl, method: &MethodDecl) -> Option<Item> {
        if !self.classifier.has_relevant(&method.annotations) {
            return None;
        }
        let signature = self.method_signature(class, method);
        let mut item = Item::method(raw_class(&class.qualified_name), class.kind, signature);
        if item.method_name() != Some(FIND_VIEW_BY_ID) {
            self.classifier.classify(&method.annotations, &mut item);
        }
        Some(item)
    }

    fn visit_parameter(
        &mut self,
        class: &TypeDecl,
        method: &MethodDecl,
        index: usize,
        parameter: &ParameterDecl,
    ) -> Option<Item> {
        if !self.classifier.has_relevant(&parameter.annotations) {
            return None;
        }
        let signature = self.method_signature(class, method);
        let mut item = Item::parameter(raw_class(&class.qualified_name), class.kind, signature, index);
        self.classifier.classify(&parameter.annotations, &mut item);
        Some(item)
    }
}

/// Compact parameter list: types joined by `,`, a trailing varargs `[]`
/// spelled `...`
pub fn parameter_list(parameters: &[ParameterDecl]) -> String {
    let count = parameters.len();
    parameters
        .iter()
        .enumerate()
        .map(|(i, parameter)| {
            let spelled = fix_parameter_string(&parameter.type_name);
            match spelled.strip_suffix("[]") {
                Some(element) if parameter.is_varargs && i + 1 == count => format!("{}...", element),
                _ => spelled,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{AnnotationValue, SourceAnnotation};
    use crate::model::names::{INT_DEF, SUPPORT_KEEP, SUPPORT_NOTNULL, SUPPORT_NULLABLE};
    use crate::model::ItemKey;

    fn parameter(type_name: &str, is_varargs: bool, annotations: Vec<SourceAnnotation>) -> ParameterDecl {
        ParameterDecl {
            name: "p".into(),
            type_name: type_name.into(),
            is_varargs,
            annotations,
        }
    }

    fn method(name: &str, parameters: Vec<ParameterDecl>, annotations: Vec<SourceAnnotation>) -> MethodDecl {
        MethodDecl {
            name: name.into(),
            return_type: Some("android.view.View".into()),
            is_constructor: false,
            parameters,
            annotations,
        }
    }

    fn unit(types: Vec<TypeDecl>) -> CompilationUnit {
        CompilationUnit {
            path: PathBuf::new(),
            types,
        }
    }

    #[test]
    fn test_parameter_list() {
        let params = vec![
            parameter("java.util.Map<java.lang.String, java.lang.String>", false, vec![]),
            parameter("java.lang.String[]", true, vec![]),
        ];
        assert_eq!(
            parameter_list(&params),
            "java.util.Map<java.lang.String,java.lang.String>,java.lang.String..."
        );
        assert_eq!(parameter_list(&[parameter("int[]", false, vec![])]), "int[]");
    }

    #[test]
    fn test_method_and_parameter_items() {
        let mut class = TypeDecl::new("pkg.Foo", ClassKind::Class);
        class.methods.push(method(
            "bar",
            vec![parameter("int", false, vec![SourceAnnotation::new(SUPPORT_NOTNULL)])],
            vec![SourceAnnotation::new(SUPPORT_NULLABLE)],
        ));

        let mut extractor = Extractor::new(ExtractOptions::default(), None, TypedefFacts::default());
        extractor.analyze(&unit(vec![class]));

        let store = extractor.store();
        assert_eq!(store.len(), 2);
        let key = ItemKey::Method {
            class: "pkg.Foo".into(),
            name: "bar".into(),
            parameters: "int".into(),
            is_constructor: false,
        };
        assert_eq!(store.find("pkg.Foo", &key).unwrap().annotations[0].name, SUPPORT_NULLABLE);
        assert_eq!(extractor.stats().total(), 2);
    }

    #[test]
    fn test_find_view_by_id_return_is_skipped() {
        let mut class = TypeDecl::new("android.app.Activity", ClassKind::Class);
        class.methods.push(method(
            FIND_VIEW_BY_ID,
            vec![parameter("int", false, vec![SourceAnnotation::new("android.support.annotation.IdRes")])],
            vec![SourceAnnotation::new(SUPPORT_NULLABLE)],
        ));

        let mut extractor = Extractor::new(ExtractOptions::default(), None, TypedefFacts::default());
        extractor.analyze(&unit(vec![class]));

        let snapshot = extractor.store().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].items.len(), 1);
        assert!(matches!(snapshot[0].items[0].kind, ItemKind::Parameter { .. }));
    }

    #[test]
    fn test_member_typedef_declaration_is_skipped() {
        let mut typedef = TypeDecl::new("pkg.Foo.Mode", ClassKind::Annotation);
        typedef.is_member = true;
        typedef.annotations.push(
            SourceAnnotation::new(INT_DEF).with_attribute(None, AnnotationValue::Array(vec![])),
        );
        typedef.methods.push(method("value", vec![], vec![SourceAnnotation::new(SUPPORT_NULLABLE)]));

        let mut extractor = Extractor::new(ExtractOptions::default(), None, TypedefFacts::default());
        extractor.analyze(&unit(vec![typedef]));
        assert!(extractor.store().is_empty());
    }

    #[test]
    fn test_keep_constructor_export() {
        let mut class = TypeDecl::new("pkg.Foo", ClassKind::Class);
        class.methods.push(MethodDecl {
            name: "Foo".into(),
            return_type: None,
            is_constructor: true,
            parameters: vec![],
            annotations: vec![SourceAnnotation::new(SUPPORT_KEEP)],
        });

        let mut extractor = Extractor::new(ExtractOptions::default(), None, TypedefFacts::default());
        extractor.analyze(&unit(vec![class]));

        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("annotations.zip");
        let rules = dir.path().join("proguard.txt");
        let summary = extractor.export(Some(&zip), Some(&rules)).unwrap();

        assert!(!summary.archive_written);
        assert!(!zip.exists());
        assert_eq!(summary.keep_rules, 1);
        assert_eq!(
            std::fs::read_to_string(&rules).unwrap(),
            "-keep class pkg.Foo {\n    <init>()\n}\n\n"
        );
    }

    #[test]
    fn test_duplicate_units_are_analyzed_once() {
        let mut class = TypeDecl::new("pkg.Foo", ClassKind::Class);
        class.annotations.push(SourceAnnotation::new("android.support.annotation.UiThread"));
        let unit = CompilationUnit {
            path: PathBuf::from("pkg/Foo.java"),
            types: vec![class],
        };

        let mut extractor = Extractor::new(ExtractOptions::default(), None, TypedefFacts::default());
        extractor.extract_from_units(&[unit.clone(), unit]);
        assert_eq!(extractor.stats().total(), 1);
    }
}
