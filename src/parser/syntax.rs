// Syntax-level view of a Java compilation unit
//
// Everything here is spelled as written in source; name resolution and
// constant folding happen later in the resolver.

use crate::model::ClassKind;
use std::fmt;
use std::path::PathBuf;

/// One parsed source file
#[derive(Debug, Clone, Default)]
pub struct ParsedUnit {
    pub path: PathBuf,
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub types: Vec<TypeSyntax>,
    /// Whether tree-sitter reported syntax errors
    pub has_errors: bool,
}

impl ParsedUnit {
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }

    /// Qualify a top level type name with the unit's package
    pub fn qualify(&self, name: &str) -> String {
        match &self.package {
            Some(package) => format!("{}.{}", package, name),
            None => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported name without the trailing `.*`
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
}

#[derive(Debug, Clone)]
pub struct TypeSyntax {
    pub name: String,
    pub kind: ClassKind,
    pub is_public: bool,
    pub type_parameters: Vec<String>,
    pub annotations: Vec<AnnotationSyntax>,
    pub fields: Vec<FieldSyntax>,
    pub methods: Vec<MethodSyntax>,
    pub enum_constants: Vec<String>,
    pub nested: Vec<TypeSyntax>,
}

impl TypeSyntax {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_public: false,
            type_parameters: Vec::new(),
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            enum_constants: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSyntax> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct FieldSyntax {
    pub name: String,
    pub type_ref: TypeRef,
    pub is_static: bool,
    pub is_final: bool,
    pub annotations: Vec<AnnotationSyntax>,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct MethodSyntax {
    pub name: String,
    /// `None` for constructors
    pub return_type: Option<TypeRef>,
    pub is_constructor: bool,
    pub type_parameters: Vec<String>,
    pub parameters: Vec<ParameterSyntax>,
    pub annotations: Vec<AnnotationSyntax>,
}

#[derive(Debug, Clone)]
pub struct ParameterSyntax {
    pub name: String,
    /// Declared type; a varargs parameter carries the array type
    pub type_ref: TypeRef,
    pub is_varargs: bool,
    pub annotations: Vec<AnnotationSyntax>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSyntax {
    /// Name as written, possibly dotted
    pub name: String,
    pub arguments: Vec<(Option<String>, Expr)>,
}

impl AnnotationSyntax {
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// A type as written
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// Primitive, class or type variable, possibly dotted and parameterized
    Named { name: String, arguments: Vec<TypeRef> },
    Array(Box<TypeRef>),
    /// `?`, `? extends T` or `? super T`
    Wildcard(Option<(WildcardBound, Box<TypeRef>)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardBound {
    Extends,
    Super,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Named { name, arguments } if arguments.is_empty() && is_primitive(name))
    }
}

pub fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "int" | "long" | "short" | "byte" | "char" | "boolean" | "float" | "double" | "void"
    )
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name, arguments } => {
                f.write_str(name)?;
                if !arguments.is_empty() {
                    f.write_str("<")?;
                    for (i, argument) in arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{}", argument)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Array(element) => write!(f, "{}[]", element),
            TypeRef::Wildcard(None) => f.write_str("?"),
            TypeRef::Wildcard(Some((WildcardBound::Extends, bound))) => write!(f, "? extends {}", bound),
            TypeRef::Wildcard(Some((WildcardBound::Super, bound))) => write!(f, "? super {}", bound),
        }
    }
}

/// Expressions that can appear in annotation values and constant
/// initializers. Anything else is kept as source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Identifier or dotted name, e.g. `A`, `Foo.A`, `pkg.Foo.A`
    Name(Vec<String>),
    ClassLiteral(TypeRef),
    Unary { operator: String, operand: Box<Expr> },
    Binary { left: Box<Expr>, operator: String, right: Box<Expr> },
    Cast { type_ref: TypeRef, value: Box<Expr> },
    Array(Vec<Expr>),
    Annotation(AnnotationSyntax),
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal as written, including any `L` suffix
    Integer(String),
    Float(String),
    /// String contents between the quotes, escapes as written
    Str(String),
    Char(char),
    Bool(bool),
    Null,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::Integer(text)) | Expr::Literal(Literal::Float(text)) => f.write_str(text),
            Expr::Literal(Literal::Str(text)) => write!(f, "\"{}\"", text),
            Expr::Literal(Literal::Char(c)) => write!(f, "'{}'", c),
            Expr::Literal(Literal::Bool(value)) => write!(f, "{}", value),
            Expr::Literal(Literal::Null) => f.write_str("null"),
            Expr::Name(path) => f.write_str(&path.join(".")),
            Expr::ClassLiteral(type_ref) => write!(f, "{}.class", type_ref),
            Expr::Unary { operator, operand } => write!(f, "{}{}", operator, operand),
            Expr::Binary { left, operator, right } => write!(f, "{} {} {}", left, operator, right),
            Expr::Cast { type_ref, value } => write!(f, "({}) {}", type_ref, value),
            Expr::Array(elements) => {
                f.write_str("{")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("}")
            }
            Expr::Annotation(annotation) => write!(f, "@{}", annotation.name),
            Expr::Other(text) => f.write_str(text),
        }
    }
}
