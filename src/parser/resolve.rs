// Name resolution over parsed Java units
//
// Builds a symbol index over every unit of the source set, then turns each
// unit into declaration facts: type and annotation names qualified, constant
// initializers folded, typedef annotation types collected.

use super::syntax::{is_primitive, AnnotationSyntax, Expr, Literal, MethodSyntax, ParsedUnit, TypeRef, TypeSyntax};
use crate::facts::{
    AnnotationValue, CompilationUnit, Constant, FieldDecl, MethodDecl, ParameterDecl, Retention, SourceAnnotation,
    SourceAttribute, TypeDecl, TypedefFacts,
};
use crate::model::names::is_nested_annotation;
use crate::model::ClassKind;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// Bound on nested constant references followed while folding
const MAX_FOLD_DEPTH: usize = 16;

const RETENTION: &str = "java.lang.annotation.Retention";

/// `java.lang` types that are visible without an import
const JAVA_LANG_TYPES: &[&str] = &[
    "AutoCloseable",
    "Boolean",
    "Byte",
    "CharSequence",
    "Character",
    "Class",
    "Cloneable",
    "Comparable",
    "Deprecated",
    "Double",
    "Enum",
    "Error",
    "Exception",
    "Float",
    "FunctionalInterface",
    "IllegalArgumentException",
    "IllegalStateException",
    "Integer",
    "Iterable",
    "Long",
    "Math",
    "Number",
    "Object",
    "Override",
    "Runnable",
    "RuntimeException",
    "SafeVarargs",
    "Short",
    "String",
    "StringBuilder",
    "SuppressWarnings",
    "System",
    "Thread",
    "Throwable",
    "Void",
];

/// Annotation packages whose members are trusted through wildcard imports
/// even though they are not part of the source set
const ANNOTATION_PACKAGES: &[&str] = &[
    "android.annotation",
    "android.support.annotation",
    "java.lang.annotation",
    "org.intellij.lang.annotations",
    "org.jetbrains.annotations",
];

/// Names visible at a point of a compilation unit
#[derive(Debug, Clone)]
struct Scope<'s> {
    unit: &'s ParsedUnit,
    /// Enclosing classes, innermost first
    classes: Vec<String>,
    type_variables: Vec<&'s str>,
}

impl<'s> Scope<'s> {
    fn top(unit: &'s ParsedUnit) -> Self {
        Self {
            unit,
            classes: Vec::new(),
            type_variables: Vec::new(),
        }
    }

    fn enter(&self, class: String, type_parameters: &'s [String]) -> Self {
        let mut classes = Vec::with_capacity(self.classes.len() + 1);
        classes.push(class);
        classes.extend(self.classes.iter().cloned());
        Self {
            unit: self.unit,
            classes,
            type_variables: self.with_type_variables(type_parameters).type_variables,
        }
    }

    fn with_type_variables(&self, type_parameters: &'s [String]) -> Self {
        let mut type_variables: Vec<&'s str> = type_parameters.iter().map(String::as_str).collect();
        type_variables.extend(self.type_variables.iter().copied());
        Self {
            unit: self.unit,
            classes: self.classes.clone(),
            type_variables,
        }
    }

    fn is_type_variable(&self, name: &str) -> bool {
        self.type_variables.contains(&name)
    }
}

#[derive(Debug)]
struct TypeEntry<'a> {
    decl: &'a TypeSyntax,
    scope: Scope<'a>,
}

/// Symbol index and resolver over a whole source set
#[derive(Debug)]
pub struct Resolver<'a> {
    types: BTreeMap<String, TypeEntry<'a>>,
}

impl<'a> Resolver<'a> {
    pub fn new(units: &'a [ParsedUnit]) -> Self {
        let mut types = BTreeMap::new();
        for unit in units {
            let scope = Scope::top(unit);
            for decl in &unit.types {
                index_type(&mut types, decl, unit.qualify(&decl.name), &scope);
            }
        }
        debug!("Indexed {} types", types.len());
        Self { types }
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn has_type(&self, qualified_name: &str) -> bool {
        self.types.contains_key(qualified_name)
    }

    /// Convert one unit into declaration facts. Nested types follow their
    /// enclosing type.
    pub fn resolve_unit<'s>(&self, unit: &'s ParsedUnit) -> CompilationUnit {
        let scope = Scope::top(unit);
        let mut types = Vec::new();
        for decl in &unit.types {
            self.collect_type(decl, unit.qualify(&decl.name), false, &scope, &mut types);
        }
        CompilationUnit {
            path: unit.path.clone(),
            types,
        }
    }

    /// Typedef facts over the whole index
    pub fn typedef_facts(&self) -> TypedefFacts {
        let mut facts = TypedefFacts::default();

        for (qualified, entry) in &self.types {
            let decl = entry.decl;

            let int_fields: Vec<String> = decl
                .fields
                .iter()
                .filter(|field| field.is_static && field.type_ref == TypeRef::named("int"))
                .map(|field| field.name.clone())
                .collect();
            if !int_fields.is_empty() {
                facts.int_fields.insert(qualified.clone(), int_fields);
            }

            if decl.kind != ClassKind::Annotation {
                continue;
            }
            let retention = self.retention(decl, &entry.scope);
            facts.retention.insert(qualified.clone(), retention);
            if retention != Retention::Source {
                continue;
            }

            let annotations = self.annotations(&decl.annotations, &entry.scope);
            if annotations
                .iter()
                .any(|a| a.name.as_deref().is_some_and(is_nested_annotation))
            {
                if !decl.is_public {
                    facts.non_public_typedefs.push(qualified.clone());
                }
                facts.typedefs.insert(qualified.clone(), annotations);
            }
        }

        debug!(
            "Found {} typedefs ({} not public)",
            facts.typedefs.len(),
            facts.non_public_typedefs.len()
        );
        facts
    }

    fn collect_type<'s>(
        &self,
        decl: &'s TypeSyntax,
        qualified: String,
        is_member: bool,
        outer: &Scope<'s>,
        out: &mut Vec<TypeDecl>,
    ) {
        let scope = outer.enter(qualified.clone(), &decl.type_parameters);

        let mut type_decl = TypeDecl::new(qualified.clone(), decl.kind);
        type_decl.is_member = is_member;
        type_decl.annotations = self.annotations(&decl.annotations, &scope);
        type_decl.fields = decl
            .fields
            .iter()
            .map(|field| FieldDecl {
                name: field.name.clone(),
                type_name: self.readable(&field.type_ref, &scope),
                is_int: field.type_ref == TypeRef::named("int"),
                annotations: self.annotations(&field.annotations, &scope),
            })
            .collect();
        type_decl.methods = decl
            .methods
            .iter()
            .map(|method| self.method(method, &scope))
            .collect();
        out.push(type_decl);

        for nested in &decl.nested {
            self.collect_type(nested, format!("{}.{}", qualified, nested.name), true, &scope, out);
        }
    }

    fn method<'s>(&self, method: &'s MethodSyntax, scope: &Scope<'s>) -> MethodDecl {
        let scope = scope.with_type_variables(&method.type_parameters);
        MethodDecl {
            name: method.name.clone(),
            return_type: method.return_type.as_ref().map(|t| self.readable(t, &scope)),
            is_constructor: method.is_constructor,
            parameters: method
                .parameters
                .iter()
                .map(|parameter| ParameterDecl {
                    name: parameter.name.clone(),
                    type_name: self.readable(&parameter.type_ref, &scope),
                    is_varargs: parameter.is_varargs,
                    annotations: self.annotations(&parameter.annotations, &scope),
                })
                .collect(),
            annotations: self.annotations(&method.annotations, &scope),
        }
    }

    // Types

    fn resolve_simple(&self, name: &str, scope: &Scope<'_>) -> Option<String> {
        for class in &scope.classes {
            if simple_name(class) == name {
                return Some(class.clone());
            }
            let nested = format!("{}.{}", class, name);
            if self.types.contains_key(&nested) {
                return Some(nested);
            }
        }

        let imports = &scope.unit.imports;
        if let Some(import) = imports.iter().find(|import| {
            !import.is_wildcard
                && simple_name(&import.path) == name
                && (!import.is_static || self.types.contains_key(&import.path))
        }) {
            return Some(import.path.clone());
        }

        let local = scope.unit.qualify(name);
        if self.types.contains_key(&local) {
            return Some(local);
        }

        for import in imports.iter().filter(|import| import.is_wildcard) {
            let candidate = format!("{}.{}", import.path, name);
            if self.types.contains_key(&candidate) {
                return Some(candidate);
            }
        }

        let java_lang = format!("java.lang.{}", name);
        if JAVA_LANG_TYPES.contains(&name) || self.types.contains_key(&java_lang) {
            return Some(java_lang);
        }

        None
    }

    /// Resolve a possibly dotted type name. A dotted name whose head is not
    /// a known type is only accepted when it names an indexed type.
    fn resolve_type_name(&self, name: &str, scope: &Scope<'_>) -> Option<String> {
        match name.split_once('.') {
            None => self.resolve_simple(name, scope),
            Some((head, rest)) => match self.resolve_simple(head, scope) {
                Some(outer) => Some(format!("{}.{}", outer, rest)),
                None => self.types.contains_key(name).then(|| name.to_string()),
            },
        }
    }

    fn qualify_type(&self, type_ref: &TypeRef, scope: &Scope<'_>) -> TypeRef {
        match type_ref {
            TypeRef::Named { name, arguments } => {
                let name = if is_primitive(name) || scope.is_type_variable(name) {
                    name.clone()
                } else {
                    self.resolve_type_name(name, scope).unwrap_or_else(|| name.clone())
                };
                TypeRef::Named {
                    name,
                    arguments: arguments.iter().map(|a| self.qualify_type(a, scope)).collect(),
                }
            }
            TypeRef::Array(element) => TypeRef::array_of(self.qualify_type(element, scope)),
            TypeRef::Wildcard(bound) => TypeRef::Wildcard(
                bound
                    .as_ref()
                    .map(|(kind, bound)| (*kind, Box::new(self.qualify_type(bound, scope)))),
            ),
        }
    }

    fn readable(&self, type_ref: &TypeRef, scope: &Scope<'_>) -> String {
        self.qualify_type(type_ref, scope).to_string()
    }

    // Annotations

    fn annotation_name(&self, name: &str, scope: &Scope<'_>) -> Option<String> {
        if let Some(resolved) = self.resolve_type_name(name, scope) {
            return Some(resolved);
        }
        if let Some((head, _)) = name.split_once('.') {
            // Fully qualified reference to a type outside the source set
            return head.starts_with(char::is_lowercase).then(|| name.to_string());
        }
        scope
            .unit
            .imports
            .iter()
            .find(|import| import.is_wildcard && !import.is_static && ANNOTATION_PACKAGES.contains(&import.path.as_str()))
            .map(|import| format!("{}.{}", import.path, name))
    }

    fn annotation(&self, annotation: &AnnotationSyntax, scope: &Scope<'_>) -> SourceAnnotation {
        let name = self.annotation_name(&annotation.name, scope);
        if name.is_none() {
            debug!("Cannot resolve annotation @{} in {}", annotation.name, scope.unit.path.display());
        }
        SourceAnnotation {
            name,
            attributes: annotation
                .arguments
                .iter()
                .map(|(key, value)| SourceAttribute {
                    name: key.clone(),
                    value: self.value(value, scope),
                })
                .collect(),
        }
    }

    fn annotations(&self, annotations: &[AnnotationSyntax], scope: &Scope<'_>) -> Vec<SourceAnnotation> {
        annotations.iter().map(|a| self.annotation(a, scope)).collect()
    }

    fn retention(&self, decl: &TypeSyntax, scope: &Scope<'_>) -> Retention {
        for annotation in &decl.annotations {
            // A wildcard guess may pick the wrong annotation package; only a
            // source type of that name shadows the platform one
            let is_retention = match self.annotation_name(&annotation.name, scope) {
                Some(name) => name == RETENTION || (annotation.simple_name() == "Retention" && !self.has_type(&name)),
                None => annotation.simple_name() == "Retention",
            };
            if !is_retention {
                continue;
            }
            let policy = annotation
                .arguments
                .iter()
                .find(|(key, _)| key.as_deref().map_or(true, |key| key == "value"))
                .and_then(|(_, value)| match value {
                    Expr::Name(path) => path.last().map(String::as_str),
                    _ => None,
                });
            return match policy {
                Some("SOURCE") => Retention::Source,
                Some("RUNTIME") => Retention::Runtime,
                _ => Retention::Class,
            };
        }
        Retention::Class
    }

    // Values and constants

    fn value(&self, expr: &Expr, scope: &Scope<'_>) -> AnnotationValue {
        match expr {
            Expr::Literal(Literal::Str(text)) => AnnotationValue::Str(text.clone()),
            Expr::Literal(Literal::Integer(text)) | Expr::Literal(Literal::Float(text)) => {
                AnnotationValue::Number(text.clone())
            }
            Expr::Literal(Literal::Char(c)) => AnnotationValue::Constant(Constant::Char(*c)),
            Expr::Literal(Literal::Bool(value)) => AnnotationValue::Bool(*value),
            Expr::Literal(Literal::Null) => AnnotationValue::Null,
            Expr::Name(path) => {
                let (class, field) = self.field_ref(path, scope);
                let constant = class
                    .as_deref()
                    .and_then(|class| self.field_constant(class, &field, 0));
                AnnotationValue::FieldRef { class, field, constant }
            }
            Expr::Array(elements) => AnnotationValue::Array(elements.iter().map(|e| self.value(e, scope)).collect()),
            Expr::Annotation(nested) => AnnotationValue::Annotation(Box::new(self.annotation(nested, scope))),
            Expr::ClassLiteral(type_ref) => AnnotationValue::Unsupported(format!("{}.class", self.readable(type_ref, scope))),
            Expr::Unary { .. } | Expr::Binary { .. } | Expr::Cast { .. } => match self.fold(expr, scope, 0) {
                Some(constant) => AnnotationValue::Constant(constant),
                None => AnnotationValue::Unsupported(expr.to_string()),
            },
            Expr::Other(text) => AnnotationValue::Unsupported(text.clone()),
        }
    }

    /// Declaring class and name of a field reference. The class is `None`
    /// for a bare name that is neither a member of an enclosing class nor
    /// statically imported.
    fn field_ref(&self, path: &[String], scope: &Scope<'_>) -> (Option<String>, String) {
        let Some((field, qualifier)) = path.split_last() else {
            return (None, String::new());
        };

        if qualifier.is_empty() {
            let class = scope
                .classes
                .iter()
                .find(|class| self.declares_field(class, field))
                .cloned()
                .or_else(|| self.static_import_owner(field, scope));
            return (class, field.clone());
        }

        let qualifier = qualifier.join(".");
        let class = self.resolve_type_name(&qualifier, scope).unwrap_or(qualifier);
        (Some(class), field.clone())
    }

    fn static_import_owner(&self, field: &str, scope: &Scope<'_>) -> Option<String> {
        for import in scope.unit.imports.iter().filter(|import| import.is_static) {
            if import.is_wildcard {
                if self.declares_field(&import.path, field) {
                    return Some(import.path.clone());
                }
            } else if let Some((owner, member)) = import.path.rsplit_once('.') {
                if member == field {
                    return Some(owner.to_string());
                }
            }
        }
        None
    }

    fn declares_field(&self, class: &str, field: &str) -> bool {
        self.types.get(class).is_some_and(|entry| {
            entry.decl.field(field).is_some() || entry.decl.enum_constants.iter().any(|c| c == field)
        })
    }

    fn field_constant(&self, class: &str, field: &str, depth: usize) -> Option<Constant> {
        let entry = self.types.get(class)?;
        let declared = entry.decl.field(field)?;
        if !(declared.is_static && declared.is_final) {
            return None;
        }
        let initializer = declared.initializer.as_ref()?;
        let value = self.fold(initializer, &entry.scope, depth)?;
        cast(value, &declared.type_ref)
    }

    fn fold(&self, expr: &Expr, scope: &Scope<'_>, depth: usize) -> Option<Constant> {
        if depth > MAX_FOLD_DEPTH {
            debug!("Giving up folding {} in {}", expr, scope.unit.path.display());
            return None;
        }
        match expr {
            Expr::Literal(literal) => literal_constant(literal),
            Expr::Name(path) => {
                let (class, field) = self.field_ref(path, scope);
                self.field_constant(class.as_deref()?, &field, depth + 1)
            }
            Expr::Unary { operator, operand } => unary(operator, self.fold(operand, scope, depth + 1)?),
            Expr::Binary { left, operator, right } => binary(
                operator,
                self.fold(left, scope, depth + 1)?,
                self.fold(right, scope, depth + 1)?,
            ),
            Expr::Cast { type_ref, value } => cast(self.fold(value, scope, depth + 1)?, type_ref),
            _ => None,
        }
    }
}

fn index_type<'a>(
    types: &mut BTreeMap<String, TypeEntry<'a>>,
    decl: &'a TypeSyntax,
    qualified: String,
    outer: &Scope<'a>,
) {
    let scope = outer.enter(qualified.clone(), &decl.type_parameters);
    for nested in &decl.nested {
        index_type(types, nested, format!("{}.{}", qualified, nested.name), &scope);
    }

    match types.entry(qualified) {
        Entry::Vacant(slot) => {
            slot.insert(TypeEntry { decl, scope });
        }
        Entry::Occupied(slot) => {
            debug!("Duplicate type {} in {}", slot.key(), scope.unit.path.display());
        }
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Numeric view of a constant after binary numeric promotion rules
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i32),
    Long(i64),
    Double(f64),
}

impl Num {
    fn of(constant: &Constant) -> Option<Self> {
        match constant {
            Constant::Int(value) => Some(Num::Int(*value as i32)),
            Constant::Long(value) => Some(Num::Long(*value)),
            Constant::Double(value) => Some(Num::Double(*value)),
            Constant::Char(c) => Some(Num::Int(*c as i32)),
            Constant::Bool(_) | Constant::Str(_) => None,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Num::Int(value) => value as i64,
            Num::Long(value) => value,
            Num::Double(value) => value as i64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(value) => value as f64,
            Num::Long(value) => value as f64,
            Num::Double(value) => value,
        }
    }

    fn into_constant(self) -> Constant {
        match self {
            Num::Int(value) => Constant::Int(value as i64),
            Num::Long(value) => Constant::Long(value),
            Num::Double(value) => Constant::Double(value),
        }
    }
}

fn literal_constant(literal: &Literal) -> Option<Constant> {
    match literal {
        Literal::Integer(text) => parse_integer(text),
        Literal::Float(text) => parse_float(text).map(Constant::Double),
        Literal::Str(text) => Some(Constant::Str(text.clone())),
        Literal::Char(c) => Some(Constant::Char(*c)),
        Literal::Bool(value) => Some(Constant::Bool(*value)),
        Literal::Null => None,
    }
}

/// Integer literal in any radix. Int literals keep Java's 32-bit wrapping,
/// so `0xFFFFFFFF` is `-1`.
fn parse_integer(text: &str) -> Option<Constant> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let (digits, is_long) = match cleaned.strip_suffix(&['l', 'L'][..]) {
        Some(digits) => (digits, true),
        None => (cleaned.as_str(), false),
    };

    let (radix, body) = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(binary) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        (2, binary)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    let value = u64::from_str_radix(body, radix).ok()?;
    if is_long {
        Some(Constant::Long(value as i64))
    } else {
        Some(Constant::Int(value as u32 as i32 as i64))
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let digits = cleaned.strip_suffix(&['f', 'F', 'd', 'D'][..]).unwrap_or(&cleaned);
    digits.parse().ok()
}

fn unary(operator: &str, operand: Constant) -> Option<Constant> {
    if let Constant::Bool(value) = operand {
        return (operator == "!").then_some(Constant::Bool(!value));
    }
    let value = Num::of(&operand)?;
    let result = match (operator, value) {
        ("+", value) => value,
        ("-", Num::Int(v)) => Num::Int(v.wrapping_neg()),
        ("-", Num::Long(v)) => Num::Long(v.wrapping_neg()),
        ("-", Num::Double(v)) => Num::Double(-v),
        ("~", Num::Int(v)) => Num::Int(!v),
        ("~", Num::Long(v)) => Num::Long(!v),
        _ => return None,
    };
    Some(result.into_constant())
}

fn binary(operator: &str, left: Constant, right: Constant) -> Option<Constant> {
    if operator == "+" && (matches!(left, Constant::Str(_)) || matches!(right, Constant::Str(_))) {
        return Some(Constant::Str(format!("{}{}", concat_text(&left), concat_text(&right))));
    }

    if let (Constant::Bool(l), Constant::Bool(r)) = (&left, &right) {
        let (l, r) = (*l, *r);
        return match operator {
            "&&" | "&" => Some(Constant::Bool(l && r)),
            "||" | "|" => Some(Constant::Bool(l || r)),
            "^" | "!=" => Some(Constant::Bool(l != r)),
            "==" => Some(Constant::Bool(l == r)),
            _ => None,
        };
    }

    let (l, r) = (Num::of(&left)?, Num::of(&right)?);

    if matches!(operator, "<<" | ">>" | ">>>") {
        return shift(operator, l, r).map(Num::into_constant);
    }

    if let Some(result) = compare(operator, l, r) {
        return Some(Constant::Bool(result));
    }

    let result = match (l, r) {
        (Num::Double(_), _) | (_, Num::Double(_)) => {
            let (a, b) = (l.as_f64(), r.as_f64());
            Num::Double(match operator {
                "+" => a + b,
                "-" => a - b,
                "*" => a * b,
                "/" => a / b,
                "%" => a % b,
                _ => return None,
            })
        }
        (Num::Long(_), _) | (_, Num::Long(_)) => {
            let (a, b) = (l.as_i64(), r.as_i64());
            Num::Long(match operator {
                "+" => a.wrapping_add(b),
                "-" => a.wrapping_sub(b),
                "*" => a.wrapping_mul(b),
                "/" => a.checked_div(b)?,
                "%" => a.checked_rem(b)?,
                "|" => a | b,
                "&" => a & b,
                "^" => a ^ b,
                _ => return None,
            })
        }
        _ => {
            let (a, b) = (l.as_i64() as i32, r.as_i64() as i32);
            Num::Int(match operator {
                "+" => a.wrapping_add(b),
                "-" => a.wrapping_sub(b),
                "*" => a.wrapping_mul(b),
                "/" => a.checked_div(b)?,
                "%" => a.checked_rem(b)?,
                "|" => a | b,
                "&" => a & b,
                "^" => a ^ b,
                _ => return None,
            })
        }
    };
    Some(result.into_constant())
}

fn shift(operator: &str, value: Num, amount: Num) -> Option<Num> {
    if matches!(amount, Num::Double(_)) {
        return None;
    }
    let amount = amount.as_i64() as u32;
    match value {
        Num::Int(v) => {
            let n = amount & 0x1f;
            Some(Num::Int(match operator {
                "<<" => v.wrapping_shl(n),
                ">>" => v.wrapping_shr(n),
                _ => ((v as u32) >> n) as i32,
            }))
        }
        Num::Long(v) => {
            let n = amount & 0x3f;
            Some(Num::Long(match operator {
                "<<" => v.wrapping_shl(n),
                ">>" => v.wrapping_shr(n),
                _ => ((v as u64) >> n) as i64,
            }))
        }
        Num::Double(_) => None,
    }
}

fn compare(operator: &str, l: Num, r: Num) -> Option<bool> {
    let ordering = l.as_f64().partial_cmp(&r.as_f64());
    let both_integral = !matches!(l, Num::Double(_)) && !matches!(r, Num::Double(_));
    let ordering = if both_integral {
        Some(l.as_i64().cmp(&r.as_i64()))
    } else {
        ordering
    };
    use std::cmp::Ordering::*;
    match operator {
        "==" => Some(ordering == Some(Equal)),
        "!=" => Some(ordering != Some(Equal)),
        "<" => Some(ordering == Some(Less)),
        ">" => Some(ordering == Some(Greater)),
        "<=" => Some(matches!(ordering, Some(Less | Equal))),
        ">=" => Some(matches!(ordering, Some(Greater | Equal))),
        _ => None,
    }
}

fn concat_text(constant: &Constant) -> String {
    match constant {
        Constant::Str(text) => text.clone(),
        Constant::Char(c) => c.to_string(),
        Constant::Int(value) | Constant::Long(value) => value.to_string(),
        Constant::Double(value) => format!("{:?}", value),
        Constant::Bool(value) => value.to_string(),
    }
}

/// Convert a constant to a declared or cast-to type. Reference types keep
/// the value as is.
fn cast(value: Constant, type_ref: &TypeRef) -> Option<Constant> {
    let TypeRef::Named { name, arguments } = type_ref else {
        return Some(value);
    };
    if !arguments.is_empty() {
        return Some(value);
    }

    match name.as_str() {
        "boolean" => matches!(value, Constant::Bool(_)).then_some(value),
        "int" | "short" | "byte" | "char" | "long" | "float" | "double" => {
            let number = Num::of(&value)?;
            Some(match name.as_str() {
                "int" => Constant::Int(number.as_i64() as i32 as i64),
                "short" => Constant::Int(number.as_i64() as i16 as i64),
                "byte" => Constant::Int(number.as_i64() as i8 as i64),
                "char" => Constant::Char(char::from_u32(number.as_i64() as u16 as u32)?),
                "long" => Constant::Long(number.as_i64()),
                _ => Constant::Double(number.as_f64()),
            })
        }
        _ => Some(value),
    }
}
