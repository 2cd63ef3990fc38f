// Annotation classifier
//
// Decides which source annotations are worth recording and translates them
// into the portable annotation namespace.

use super::typedefs::{TypedefLookup, TypedefResolver};
use crate::facts::{Retention, SourceAnnotation};
use crate::model::names::{
    IDEA_CONTRACT, INT_DEF, RESOURCE_TYPE_SUFFIX, STRING_DEF, SUPPORT_KEEP, SUPPORT_NOTNULL, SUPPORT_NULLABLE,
};
use crate::model::{AnnotationData, Item, NamespaceMap};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

pub struct AnnotationClassifier {
    names: NamespaceMap,
    include_class_retention: bool,
    source_retention: HashMap<String, bool>,
    typedefs: TypedefResolver,
    stats: BTreeMap<String, usize>,
    dropped: HashSet<String>,
}

impl AnnotationClassifier {
    pub fn new(names: NamespaceMap, typedefs: TypedefResolver, include_class_retention: bool) -> Self {
        let mut source_retention = HashMap::new();
        // Typedef containers only work with source retention; the nullness
        // annotations have always been class retention.
        source_retention.insert(INT_DEF.to_string(), true);
        source_retention.insert(STRING_DEF.to_string(), true);
        source_retention.insert(SUPPORT_NOTNULL.to_string(), false);
        source_retention.insert(SUPPORT_NULLABLE.to_string(), false);

        Self {
            names,
            include_class_retention,
            source_retention,
            typedefs,
            stats: BTreeMap::new(),
            dropped: HashSet::new(),
        }
    }

    /// Number of recorded annotations per portable name
    pub fn stats(&self) -> &BTreeMap<String, usize> {
        &self.stats
    }

    pub fn typedefs(&self) -> &TypedefResolver {
        &self.typedefs
    }

    pub fn has_relevant(&mut self, annotations: &[SourceAnnotation]) -> bool {
        annotations.iter().any(|a| self.is_relevant(a))
    }

    pub fn is_relevant(&mut self, annotation: &SourceAnnotation) -> bool {
        let relevant = match annotation.name.as_deref() {
            None => false,
            Some(name) if name.starts_with("java.lang.") => false,
            Some(name) if self.names.is_portable(name) => {
                name == SUPPORT_KEEP || self.include_class_retention || self.has_source_retention(name)
            }
            Some(name) if self.names.is_platform(name) => !self.names.is_excluded(name),
            Some(IDEA_CONTRACT) => true,
            Some(name) => self.is_magic_constant(name),
        };

        if !relevant {
            if let Some(name) = &annotation.name {
                if self.dropped.insert(name.clone()) {
                    debug!("Ignoring annotation {}", name);
                }
            }
        }
        relevant
    }

    /// Classify the annotations of a declaration onto `item`. Keep
    /// annotations only mark the item; everything else is translated and
    /// appended to its annotation list.
    pub fn classify(&mut self, annotations: &[SourceAnnotation], item: &mut Item) {
        for annotation in annotations {
            if !self.is_relevant(annotation) {
                continue;
            }
            let Some(name) = annotation.name.as_deref() else {
                continue;
            };
            if name == SUPPORT_KEEP {
                item.keep = true;
            } else {
                self.add_annotation(annotation, name, &mut item.annotations);
            }
        }
    }

    fn add_annotation(&mut self, annotation: &SourceAnnotation, name: &str, list: &mut Vec<AnnotationData>) {
        if name == self.names.nullable.0 || name == self.names.nullable.1 {
            let portable = self.names.nullable.1.clone();
            self.record_stats(&portable);
            list.push(AnnotationData::new(portable));
            return;
        }
        if name == self.names.non_null.0 || name == self.names.non_null.1 {
            let portable = self.names.non_null.1.clone();
            self.record_stats(&portable);
            list.push(AnnotationData::new(portable));
            return;
        }

        if self.names.is_platform(name) {
            if self.names.is_excluded(name) {
                return;
            }
            let portable = self.names.to_portable(name);
            if !self.include_class_retention && !self.has_source_retention(&portable) {
                return;
            }
            self.record_stats(&portable);
            if name.ends_with(RESOURCE_TYPE_SUFFIX) {
                list.push(AnnotationData::new(portable));
            } else {
                list.push(AnnotationData::with_source(portable, annotation.attributes.clone()));
            }
            return;
        }

        if self.names.is_portable(name) {
            self.record_stats(name);
            if name.ends_with(RESOURCE_TYPE_SUFFIX) {
                list.push(AnnotationData::new(name));
            } else {
                list.push(AnnotationData::with_source(name, annotation.attributes.clone()));
            }
            return;
        }

        if name == IDEA_CONTRACT {
            self.record_stats(name);
            list.push(AnnotationData::with_source(name, annotation.attributes.clone()));
            return;
        }

        if self.is_magic_constant(name) {
            if let Some(indirect) = self.typedefs.resolved(name) {
                list.extend(indirect.iter().cloned());
            }
        }
    }

    /// Whether `type_name` is a typedef container, resolving it on first use
    fn is_magic_constant(&mut self, type_name: &str) -> bool {
        match self.typedefs.lookup(type_name) {
            TypedefLookup::Magic => true,
            TypedefLookup::NotMagic => false,
            TypedefLookup::Pending(containers) => {
                let mut resolved = Vec::with_capacity(containers.len());
                for container in &containers {
                    if let Some(name) = container.name.as_deref() {
                        self.add_annotation(container, name, &mut resolved);
                    }
                }
                self.typedefs.record(type_name, resolved);
                true
            }
        }
    }

    fn has_source_retention(&mut self, name: &str) -> bool {
        if let Some(&known) = self.source_retention.get(name) {
            return known;
        }
        let source = self.typedefs.facts().retention_of(name) == Some(Retention::Source);
        self.source_retention.insert(name.to_string(), source);
        source
    }

    fn record_stats(&mut self, name: &str) {
        *self.stats.entry(name.to_string()).or_insert(0) += 1;
    }
}
