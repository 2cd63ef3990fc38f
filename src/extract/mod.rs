// Annotation extraction engine
//
// - classifier: relevance and namespace translation of source annotations
// - typedefs: one level of typedef (magic constant) indirection
// - store: accumulated items per package and class
// - merge: import of existing annotation XML and archives
// - extractor: the declaration visitor driving all of the above

mod classifier;
mod extractor;
mod merge;
mod stats;
mod store;
mod typedefs;

pub use classifier::AnnotationClassifier;
pub use extractor::{parameter_list, ExtractOptions, Extractor};
pub use merge::{fix_parameter_string, remove_filtered, MergeEngine, MergeError};
pub use stats::ExtractionStats;
pub use store::{merge_annotations, package_of, AddOutcome, ItemStore, PackageItems};
pub use typedefs::{expand_values_from_class, TypedefLookup, TypedefResolver};
