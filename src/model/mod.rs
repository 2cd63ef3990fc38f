// Item model: annotatable elements and their annotations

mod annotation;
mod item;
pub mod names;

pub use annotation::{AnnotationData, Attributes};
pub use item::{escape_xml, ClassKind, Item, ItemKey, ItemKind, MethodSignature};
pub use names::NamespaceMap;
