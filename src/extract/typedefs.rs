// Typedef (magic constant) resolution
//
// A typedef is a source-retention annotation type that is itself annotated
// with one of the container annotations (@IntDef, @StringDef, @IntRange,
// @RequiresPermission). Using the typedef on an element is equivalent to
// putting the container annotation there directly. Only one level of
// indirection is followed.

use crate::api::ApiDatabase;
use crate::facts::{SourceAnnotation, TypedefFacts};
use crate::model::names::is_builtin_container;
use crate::model::names::is_nested_annotation;
use crate::model::AnnotationData;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of a typedef lookup
#[derive(Debug)]
pub enum TypedefLookup {
    Magic,
    NotMagic,
    /// A typedef whose container annotations still need classifying
    Pending(Vec<SourceAnnotation>),
}

#[derive(Debug)]
pub struct TypedefResolver {
    facts: Arc<TypedefFacts>,
    resolved: HashMap<String, Vec<AnnotationData>>,
    irrelevant: HashSet<String>,
}

impl TypedefResolver {
    pub fn new(facts: Arc<TypedefFacts>) -> Self {
        Self {
            facts,
            resolved: HashMap::new(),
            irrelevant: HashSet::new(),
        }
    }

    pub fn facts(&self) -> &TypedefFacts {
        &self.facts
    }

    pub fn lookup(&mut self, type_name: &str) -> TypedefLookup {
        if self.irrelevant.contains(type_name) || type_name.starts_with("java.lang.") {
            return TypedefLookup::NotMagic;
        }
        if self.resolved.contains_key(type_name) || is_builtin_container(type_name) {
            return TypedefLookup::Magic;
        }

        match self.facts.typedefs.get(type_name) {
            Some(annotations) => {
                let containers: Vec<SourceAnnotation> = annotations
                    .iter()
                    .filter(|a| a.name.as_deref().is_some_and(is_nested_annotation))
                    .cloned()
                    .collect();
                if containers.is_empty() {
                    self.irrelevant.insert(type_name.to_string());
                    TypedefLookup::NotMagic
                } else {
                    TypedefLookup::Pending(containers)
                }
            }
            None => {
                self.irrelevant.insert(type_name.to_string());
                TypedefLookup::NotMagic
            }
        }
    }

    /// Store the classified container annotations of a typedef
    pub fn record(&mut self, type_name: &str, annotations: Vec<AnnotationData>) {
        self.resolved.insert(type_name.to_string(), annotations);
    }

    pub fn resolved(&self, type_name: &str) -> Option<&[AnnotationData]> {
        self.resolved.get(type_name).map(Vec::as_slice)
    }
}

/// Expand `valuesFromClass = C.class` into an explicit constant list
/// `{C.A, C.B}`. The API database's int fields are authoritative; the
/// declaration order known from source is used to rank them. Returns `None`
/// when no constant could be found.
pub fn expand_values_from_class(
    class_name: &str,
    api: Option<&ApiDatabase>,
    declared: Option<&[String]>,
) -> Option<String> {
    let mut names: Vec<String> = Vec::new();

    if let Some(api) = api {
        let fields: Option<Vec<String>> = if class_name == "java.util.zip.ZipEntry" {
            // ZipEntry inherits a pile of unrelated ZipConstants
            Some(vec!["DEFLATED".to_string(), "STORED".to_string()])
        } else {
            api.declared_int_fields(class_name)
                .map(|fields| fields.iter().cloned().collect())
        };

        if let Some(mut sorted) = fields {
            sorted.sort();
            if let Some(declared) = declared {
                let mut rank: HashMap<String, usize> = HashMap::new();
                for (i, name) in sorted.iter().enumerate() {
                    rank.insert(name.clone(), declared.len() + i);
                }
                for (i, name) in declared.iter().enumerate() {
                    rank.insert(name.clone(), i);
                }
                sorted.sort_by(|a, b| rank[a.as_str()].cmp(&rank[b.as_str()]).then_with(|| a.cmp(b)));
            }
            names = sorted;
        }
    }

    if names.is_empty() {
        if let Some(declared) = declared {
            if api.map_or(true, |api| api.has_class(class_name)) {
                names = declared.to_vec();
            }
        }
    }

    if names.is_empty() {
        return None;
    }

    let values: Vec<String> = names.iter().map(|name| format!("{}.{}", class_name, name)).collect();
    Some(format!("{{{}}}", values.join(", ")))
}
