// Declaration facts: the contract between a source front end and the
// extraction engine.

mod declaration;
mod visitor;

pub use declaration::{
    AnnotationValue, CompilationUnit, Constant, FieldDecl, MethodDecl, ParameterDecl, Retention,
    SourceAnnotation, SourceAttribute, TypeDecl, TypedefFacts,
};
pub use visitor::{walk_unit, DeclarationVisitor};
