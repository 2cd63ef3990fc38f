//! annotextract - External annotations for Java sources
//!
//! Collects type-constraint annotations (nullness, `@IntDef`/`@StringDef`
//! typedefs, `*Res` resource types, `@RequiresPermission`, `@IntRange`,
//! `@Keep`, `@Contract`) from Java declarations and writes them into an
//! external annotations archive plus ProGuard keep rules.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! 1. **File Discovery** - Find all .java files under the source roots
//! 2. **Parsing** - Parse source files using tree-sitter, in parallel
//! 3. **Resolution** - Qualify names and fold constants into declaration facts
//! 4. **Extraction** - Classify annotations into signature-keyed items
//! 5. **Merging** - Fold in previously exported annotations, filtered by an API listing
//! 6. **Export** - Write `annotations.xml` per package into a zip, and keep rules

pub mod api;
pub mod config;
pub mod discovery;
pub mod export;
pub mod extract;
pub mod facts;
pub mod model;
pub mod parser;
pub mod proguard;

pub use api::ApiDatabase;
pub use config::Config;
pub use discovery::FileFinder;
pub use export::{ExportError, ExportSummary};
pub use extract::{ExtractOptions, ExtractionStats, Extractor};
pub use facts::{CompilationUnit, DeclarationVisitor, TypedefFacts};
pub use model::{AnnotationData, Item, ItemKind};
pub use parser::{build_facts, JavaParser, ParsedUnit, Resolver};
