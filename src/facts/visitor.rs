// Visitor over declaration facts

use super::declaration::{CompilationUnit, FieldDecl, MethodDecl, ParameterDecl, TypeDecl};
use crate::model::Item;

/// One method per declaration category. Each returns the classified item,
/// or `None` when the declaration carries nothing worth recording.
pub trait DeclarationVisitor {
    /// Whether to skip a type declaration together with its members
    fn skip_class(&mut self, _class: &TypeDecl) -> bool {
        false
    }

    fn visit_class(&mut self, class: &TypeDecl) -> Option<Item>;

    fn visit_field(&mut self, class: &TypeDecl, field: &FieldDecl) -> Option<Item>;

    fn visit_method(&mut self, class: &TypeDecl, method: &MethodDecl) -> Option<Item>;

    fn visit_parameter(
        &mut self,
        class: &TypeDecl,
        method: &MethodDecl,
        index: usize,
        parameter: &ParameterDecl,
    ) -> Option<Item>;
}

/// Drive a visitor over every declaration of a unit, in source order, and
/// collect the items it produced.
pub fn walk_unit<V: DeclarationVisitor + ?Sized>(visitor: &mut V, unit: &CompilationUnit) -> Vec<Item> {
    let mut items = Vec::new();

    for class in &unit.types {
        if visitor.skip_class(class) {
            continue;
        }
        items.extend(visitor.visit_class(class));

        for field in &class.fields {
            items.extend(visitor.visit_field(class, field));
        }

        for method in &class.methods {
            items.extend(visitor.visit_method(class, method));
            for (index, parameter) in method.parameters.iter().enumerate() {
                items.extend(visitor.visit_parameter(class, method, index, parameter));
            }
        }
    }

    items
}
