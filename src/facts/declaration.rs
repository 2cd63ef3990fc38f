//! Declaration facts handed to the extraction engine by a front end.
//!
//! Names are already resolved: annotation names are fully qualified (or
//! `None` when the front end could not resolve them), class names are
//! qualified with nested types joined by `.`, and type names are the
//! readable, generic-aware spelling (`java.util.Map<java.lang.String,int>`).

use crate::model::ClassKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

/// One parsed source file
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub path: PathBuf,
    pub types: Vec<TypeDecl>,
}

/// A class, interface, enum or annotation type. Nested types appear as
/// separate entries with `is_member` set.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub qualified_name: String,
    pub kind: ClassKind,
    pub is_member: bool,
    pub annotations: Vec<SourceAnnotation>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

impl TypeDecl {
    pub fn new(qualified_name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
            is_member: false,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn simple_name(&self) -> &str {
        match self.qualified_name.rfind('.') {
            Some(index) => &self.qualified_name[index + 1..],
            None => &self.qualified_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: String,
    pub is_int: bool,
    pub annotations: Vec<SourceAnnotation>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Method name; constructors carry the simple class name
    pub name: String,
    pub return_type: Option<String>,
    pub is_constructor: bool,
    pub parameters: Vec<ParameterDecl>,
    pub annotations: Vec<SourceAnnotation>,
}

#[derive(Debug, Clone)]
pub struct ParameterDecl {
    pub name: String,
    /// Readable type; a varargs parameter is spelled with a trailing `[]`
    pub type_name: String,
    pub is_varargs: bool,
    pub annotations: Vec<SourceAnnotation>,
}

/// An annotation occurrence as written in source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAnnotation {
    pub name: Option<String>,
    pub attributes: Vec<SourceAttribute>,
}

impl SourceAnnotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: Option<&str>, value: AnnotationValue) -> Self {
        self.attributes.push(SourceAttribute {
            name: name.map(str::to_string),
            value,
        });
        self
    }
}

/// A `name = value` pair; `name` is `None` for the single-value shorthand
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAttribute {
    pub name: Option<String>,
    pub value: AnnotationValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Array(Vec<AnnotationValue>),
    /// Reference to a field; `class` is `None` when the declaring class is unknown
    FieldRef {
        class: Option<String>,
        field: String,
        constant: Option<Constant>,
    },
    /// String literal contents, without quotes
    Str(String),
    /// Numeric literal as written
    Number(String),
    Bool(bool),
    Null,
    /// An expression the front end folded to a constant
    Constant(Constant),
    Annotation(Box<SourceAnnotation>),
    /// Anything else; carries the source text for diagnostics
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Long(i64),
    Double(f64),
    Bool(bool),
    Char(char),
    Str(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(value) | Constant::Long(value) => write!(f, "{}", value),
            Constant::Double(value) => write!(f, "{:?}", value),
            Constant::Bool(value) => write!(f, "{}", value),
            Constant::Char(value) => write!(f, "'{}'", value),
            Constant::Str(value) => write!(f, "\"{}\"", value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Retention {
    Source,
    Class,
    Runtime,
}

/// Facts about typedef annotation types collected over the whole source set
#[derive(Debug, Clone, Default)]
pub struct TypedefFacts {
    /// Source-retention annotation types carrying a container annotation,
    /// mapped to the annotations declared on them
    pub typedefs: HashMap<String, Vec<SourceAnnotation>>,
    /// Declared retention of annotation types seen in source
    pub retention: HashMap<String, Retention>,
    /// Int-typed fields per class, in declaration order
    pub int_fields: BTreeMap<String, Vec<String>>,
    /// Typedef annotation types that are not public
    pub non_public_typedefs: Vec<String>,
}

impl TypedefFacts {
    pub fn retention_of(&self, annotation_type: &str) -> Option<Retention> {
        self.retention.get(annotation_type).copied()
    }
}
