// Java parser: tree-sitter syntax tree to `ParsedUnit`

use super::common::{field_text, first_of_kind, named_children, node_text};
use super::syntax::{
    AnnotationSyntax, Expr, FieldSyntax, Import, Literal, MethodSyntax, ParameterSyntax, ParsedUnit, TypeRef,
    TypeSyntax, WildcardBound,
};
use crate::model::ClassKind;
use miette::{IntoDiagnostic, Result};
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser as TsParser};

/// Java source code parser using tree-sitter
#[derive(Debug, Default)]
pub struct JavaParser;

/// Modifiers of a declaration
#[derive(Debug, Default)]
struct Modifiers {
    is_public: bool,
    is_static: bool,
    is_final: bool,
    annotations: Vec<AnnotationSyntax>,
}

impl JavaParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, path: &Path, source: &str) -> Result<ParsedUnit> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .into_diagnostic()?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| miette::miette!("Failed to parse Java file {}", path.display()))?;

        let root = tree.root_node();
        let mut unit = ParsedUnit {
            path: path.to_path_buf(),
            has_errors: root.has_error(),
            ..Default::default()
        };

        for child in named_children(root) {
            match child.kind() {
                "package_declaration" => unit.package = self.package_name(child, source),
                "import_declaration" => unit.imports.extend(self.import(child, source)),
                kind if is_type_declaration(kind) => unit.types.extend(self.type_declaration(child, source)),
                _ => {}
            }
        }

        debug!(
            "Parsed {}: {} types, {} imports",
            path.display(),
            unit.types.len(),
            unit.imports.len()
        );

        Ok(unit)
    }

    fn package_name(&self, node: Node, source: &str) -> Option<String> {
        let mut cursor = node.walk();
        let name = node
            .children(&mut cursor)
            .find(|child| child.kind() == "scoped_identifier" || child.kind() == "identifier")
            .map(|child| strip_whitespace(node_text(child, source)));
        name
    }

    fn import(&self, node: Node, source: &str) -> Option<Import> {
        let mut path = None;
        let mut is_static = false;
        let mut is_wildcard = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "static" => is_static = true,
                "asterisk" => is_wildcard = true,
                "scoped_identifier" | "identifier" => path = Some(strip_whitespace(node_text(child, source))),
                _ => {}
            }
        }

        path.map(|path| Import {
            path,
            is_static,
            is_wildcard,
        })
    }

    fn type_declaration(&self, node: Node, source: &str) -> Option<TypeSyntax> {
        let name = field_text(node, "name", source)?;
        let kind = match node.kind() {
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            "annotation_type_declaration" => ClassKind::Annotation,
            _ => ClassKind::Class,
        };

        let modifiers = self.modifiers(node, source);
        let mut decl = TypeSyntax::new(name, kind);
        decl.is_public = modifiers.is_public;
        decl.annotations = modifiers.annotations;
        decl.type_parameters = self.type_parameters(node, source);

        // Record components become final instance fields
        if node.kind() == "record_declaration" {
            if let Some(parameters) = node.child_by_field_name("parameters") {
                for component in self.parameters(parameters, source) {
                    decl.fields.push(FieldSyntax {
                        name: component.name,
                        type_ref: component.type_ref,
                        is_static: false,
                        is_final: true,
                        annotations: component.annotations,
                        initializer: None,
                    });
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.type_body(body, source, &mut decl);
        }

        Some(decl)
    }

    fn type_body(&self, body: Node, source: &str, decl: &mut TypeSyntax) {
        // Interface and annotation type constants are implicitly static final
        let implicit_constant = matches!(decl.kind, ClassKind::Interface | ClassKind::Annotation);

        for member in named_children(body) {
            match member.kind() {
                "field_declaration" | "constant_declaration" => {
                    self.fields(member, source, implicit_constant, &mut decl.fields);
                }
                "method_declaration" | "annotation_type_element_declaration" | "constructor_declaration" => {
                    decl.methods.extend(self.method(member, source));
                }
                "enum_constant" => {
                    if let Some(name) = field_text(member, "name", source) {
                        decl.enum_constants.push(name.to_string());
                    }
                }
                "enum_body_declarations" => self.type_body(member, source, decl),
                kind if is_type_declaration(kind) => decl.nested.extend(self.type_declaration(member, source)),
                _ => {}
            }
        }
    }

    fn fields(&self, node: Node, source: &str, implicit_constant: bool, fields: &mut Vec<FieldSyntax>) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let modifiers = self.modifiers(node, source);
        let base = self.type_ref(type_node, source);

        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let Some(name) = field_text(declarator, "name", source) else {
                continue;
            };
            let type_ref = with_dimensions(base.clone(), declarator.child_by_field_name("dimensions"), source);
            let initializer = declarator
                .child_by_field_name("value")
                .map(|value| self.expression(value, source));

            fields.push(FieldSyntax {
                name: name.to_string(),
                type_ref,
                is_static: implicit_constant || modifiers.is_static,
                is_final: implicit_constant || modifiers.is_final,
                annotations: modifiers.annotations.clone(),
                initializer,
            });
        }
    }

    fn method(&self, node: Node, source: &str) -> Option<MethodSyntax> {
        let name = field_text(node, "name", source)?;
        let is_constructor = node.kind() == "constructor_declaration";
        let modifiers = self.modifiers(node, source);

        let return_type = if is_constructor {
            None
        } else {
            node.child_by_field_name("type").map(|type_node| {
                with_dimensions(
                    self.type_ref(type_node, source),
                    node.child_by_field_name("dimensions"),
                    source,
                )
            })
        };

        let parameters = node
            .child_by_field_name("parameters")
            .map(|parameters| self.parameters(parameters, source))
            .unwrap_or_default();

        Some(MethodSyntax {
            name: name.to_string(),
            return_type,
            is_constructor,
            type_parameters: self.type_parameters(node, source),
            parameters,
            annotations: modifiers.annotations,
        })
    }

    fn parameters(&self, node: Node, source: &str) -> Vec<ParameterSyntax> {
        let mut parameters = Vec::new();

        for child in named_children(node) {
            match child.kind() {
                "formal_parameter" => {
                    let Some(type_node) = child.child_by_field_name("type") else {
                        continue;
                    };
                    let modifiers = self.modifiers(child, source);
                    parameters.push(ParameterSyntax {
                        name: field_text(child, "name", source).unwrap_or_default().to_string(),
                        type_ref: with_dimensions(
                            self.type_ref(type_node, source),
                            child.child_by_field_name("dimensions"),
                            source,
                        ),
                        is_varargs: false,
                        annotations: modifiers.annotations,
                    });
                }
                "spread_parameter" => {
                    let modifiers = self.modifiers(child, source);
                    let Some(type_node) = named_children(child)
                        .into_iter()
                        .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator") && !is_annotation(*c))
                    else {
                        continue;
                    };
                    let name = first_of_kind(child, "variable_declarator")
                        .and_then(|declarator| field_text(declarator, "name", source))
                        .unwrap_or_default();
                    parameters.push(ParameterSyntax {
                        name: name.to_string(),
                        type_ref: TypeRef::array_of(self.type_ref(type_node, source)),
                        is_varargs: true,
                        annotations: modifiers.annotations,
                    });
                }
                _ => {}
            }
        }

        parameters
    }

    fn modifiers(&self, node: Node, source: &str) -> Modifiers {
        let mut result = Modifiers::default();
        let Some(modifiers) = first_of_kind(node, "modifiers") else {
            return result;
        };

        let mut cursor = modifiers.walk();
        for modifier in modifiers.children(&mut cursor) {
            match modifier.kind() {
                "marker_annotation" | "annotation" => result.annotations.extend(self.annotation(modifier, source)),
                "public" => result.is_public = true,
                "static" => result.is_static = true,
                "final" => result.is_final = true,
                _ => {}
            }
        }

        result
    }

    fn annotation(&self, node: Node, source: &str) -> Option<AnnotationSyntax> {
        let name = strip_whitespace(field_text(node, "name", source)?);
        let mut arguments = Vec::new();

        if let Some(list) = node.child_by_field_name("arguments") {
            for argument in named_children(list) {
                if argument.kind() == "element_value_pair" {
                    let key = field_text(argument, "key", source).map(str::to_string);
                    let value = argument
                        .child_by_field_name("value")
                        .map(|value| self.expression(value, source))
                        .unwrap_or_else(|| Expr::Other(String::new()));
                    arguments.push((key, value));
                } else {
                    arguments.push((None, self.expression(argument, source)));
                }
            }
        }

        Some(AnnotationSyntax { name, arguments })
    }

    fn type_parameters(&self, node: Node, source: &str) -> Vec<String> {
        let Some(parameters) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        named_children(parameters)
            .into_iter()
            .filter(|p| p.kind() == "type_parameter")
            .filter_map(|p| first_of_kind(p, "type_identifier").or_else(|| first_of_kind(p, "identifier")))
            .map(|name| node_text(name, source).to_string())
            .collect()
    }

    fn type_ref(&self, node: Node, source: &str) -> TypeRef {
        match node.kind() {
            "generic_type" => {
                let children = named_children(node);
                let name = children
                    .iter()
                    .find(|c| c.kind() != "type_arguments")
                    .map(|c| self.type_name(*c, source))
                    .unwrap_or_default();
                let arguments = children
                    .iter()
                    .find(|c| c.kind() == "type_arguments")
                    .map(|args| {
                        named_children(*args)
                            .into_iter()
                            .filter(|a| !is_annotation(*a))
                            .map(|a| self.type_ref(a, source))
                            .collect()
                    })
                    .unwrap_or_default();
                TypeRef::Named { name, arguments }
            }
            "array_type" => {
                let element = node
                    .child_by_field_name("element")
                    .map(|element| self.type_ref(element, source))
                    .unwrap_or_else(|| TypeRef::named(strip_whitespace(node_text(node, source))));
                with_dimensions(element, node.child_by_field_name("dimensions"), source)
            }
            "wildcard" => {
                let mut bound_kind = None;
                let mut bound = None;
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "extends" => bound_kind = Some(WildcardBound::Extends),
                        "super" => bound_kind = Some(WildcardBound::Super),
                        _ if child.is_named() && !is_annotation(child) => bound = Some(self.type_ref(child, source)),
                        _ => {}
                    }
                }
                match (bound_kind, bound) {
                    (Some(kind), Some(bound)) => TypeRef::Wildcard(Some((kind, Box::new(bound)))),
                    _ => TypeRef::Wildcard(None),
                }
            }
            "annotated_type" => named_children(node)
                .into_iter()
                .rev()
                .find(|c| !is_annotation(*c))
                .map(|c| self.type_ref(c, source))
                .unwrap_or_else(|| TypeRef::named(strip_whitespace(node_text(node, source)))),
            _ => TypeRef::named(self.type_name(node, source)),
        }
    }

    /// Dotted name of a (possibly scoped) type identifier, without annotations
    fn type_name(&self, node: Node, source: &str) -> String {
        if node.kind() != "scoped_type_identifier" {
            return strip_whitespace(node_text(node, source));
        }
        let parts: Vec<String> = named_children(node)
            .into_iter()
            .filter(|c| !is_annotation(*c))
            .map(|c| match c.kind() {
                // Outer<T>.Inner keeps only the raw outer name
                "generic_type" => named_children(c)
                    .first()
                    .map(|n| self.type_name(*n, source))
                    .unwrap_or_default(),
                _ => self.type_name(c, source),
            })
            .collect();
        parts.join(".")
    }

    fn expression(&self, node: Node, source: &str) -> Expr {
        let text = node_text(node, source);
        match node.kind() {
            "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal" | "binary_integer_literal" => {
                Expr::Literal(Literal::Integer(text.to_string()))
            }
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                Expr::Literal(Literal::Float(text.to_string()))
            }
            "true" => Expr::Literal(Literal::Bool(true)),
            "false" => Expr::Literal(Literal::Bool(false)),
            "null_literal" => Expr::Literal(Literal::Null),
            "string_literal" | "text_block" => Expr::Literal(Literal::Str(string_contents(text).to_string())),
            "character_literal" => match char_value(text) {
                Some(c) => Expr::Literal(Literal::Char(c)),
                None => Expr::Other(text.to_string()),
            },
            "identifier" => Expr::Name(vec![text.to_string()]),
            "scoped_identifier" => Expr::Name(strip_whitespace(text).split('.').map(str::to_string).collect()),
            "field_access" => match self.dotted_path(node, source) {
                Some(path) => Expr::Name(path),
                None => Expr::Other(text.to_string()),
            },
            "parenthesized_expression" => match named_children(node).first() {
                Some(inner) => self.expression(*inner, source),
                None => Expr::Other(text.to_string()),
            },
            "unary_expression" => match (field_text(node, "operator", source), node.child_by_field_name("operand")) {
                (Some(operator), Some(operand)) => Expr::Unary {
                    operator: operator.to_string(),
                    operand: Box::new(self.expression(operand, source)),
                },
                _ => Expr::Other(text.to_string()),
            },
            "binary_expression" => match (
                node.child_by_field_name("left"),
                field_text(node, "operator", source),
                node.child_by_field_name("right"),
            ) {
                (Some(left), Some(operator), Some(right)) => Expr::Binary {
                    left: Box::new(self.expression(left, source)),
                    operator: operator.to_string(),
                    right: Box::new(self.expression(right, source)),
                },
                _ => Expr::Other(text.to_string()),
            },
            "cast_expression" => match (node.child_by_field_name("type"), node.child_by_field_name("value")) {
                (Some(type_node), Some(value)) => Expr::Cast {
                    type_ref: self.type_ref(type_node, source),
                    value: Box::new(self.expression(value, source)),
                },
                _ => Expr::Other(text.to_string()),
            },
            "class_literal" => match named_children(node).first() {
                Some(type_node) => Expr::ClassLiteral(self.type_ref(*type_node, source)),
                None => Expr::Other(text.to_string()),
            },
            "element_value_array_initializer" | "array_initializer" => Expr::Array(
                named_children(node)
                    .into_iter()
                    .map(|element| self.expression(element, source))
                    .collect(),
            ),
            "marker_annotation" | "annotation" => match self.annotation(node, source) {
                Some(annotation) => Expr::Annotation(annotation),
                None => Expr::Other(text.to_string()),
            },
            _ => Expr::Other(text.to_string()),
        }
    }

    /// `a.b.C` style field access chains; `None` for anything involving calls,
    /// `this` and the like.
    fn dotted_path(&self, node: Node, source: &str) -> Option<Vec<String>> {
        match node.kind() {
            "identifier" => Some(vec![node_text(node, source).to_string()]),
            "scoped_identifier" => Some(strip_whitespace(node_text(node, source)).split('.').map(str::to_string).collect()),
            "field_access" => {
                let mut path = self.dotted_path(node.child_by_field_name("object")?, source)?;
                path.push(field_text(node, "field", source)?.to_string());
                Some(path)
            }
            _ => None,
        }
    }
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "annotation_type_declaration"
            | "record_declaration"
    )
}

fn is_annotation(node: Node) -> bool {
    matches!(node.kind(), "marker_annotation" | "annotation")
}

/// Wrap `element` in one array level per `[]` of a dimensions node
fn with_dimensions(element: TypeRef, dimensions: Option<Node>, source: &str) -> TypeRef {
    let count = dimensions.map_or(0, |dims| node_text(dims, source).matches('[').count());
    (0..count).fold(element, |inner, _| TypeRef::array_of(inner))
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn string_contents(text: &str) -> &str {
    if let Some(inner) = text.strip_prefix("\"\"\"").and_then(|t| t.strip_suffix("\"\"\"")) {
        return inner;
    }
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

fn char_value(text: &str) -> Option<char> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    match chars.next()? {
        '\\' => match chars.next()? {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            's' => Some(' '),
            '0' => Some('\0'),
            'u' => {
                let hex: String = chars.skip_while(|c| *c == 'u').collect();
                u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
            }
            other => Some(other),
        },
        c if chars.next().is_none() => Some(c),
        _ => None,
    }
}
