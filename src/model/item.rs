//! Items are the annotatable program elements: classes, fields, methods
//! (including constructors) and method parameters.
//!
//! Every item renders a canonical signature string which keys it in the
//! external annotations format, e.g.
//!
//! ```text
//! pkg.Foo
//! pkg.Foo MY_FIELD
//! pkg.Foo void bar(java.util.Map&lt;java.lang.String,java.lang.String&gt;, int)
//! pkg.Foo void bar(java.util.Map&lt;java.lang.String,java.lang.String&gt;, int) 1
//! ```

use super::annotation::AnnotationData;
use crate::api::ApiDatabase;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Kind of the class containing an item; only used for keep rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

impl ClassKind {
    /// Keyword used in `-keep` rules
    pub fn keep_type(&self) -> &'static str {
        match self {
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Class | ClassKind::Annotation => "class",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: String,
    /// Comma separated parameter types without spaces
    pub parameters: String,
    pub return_type: Option<String>,
    pub is_constructor: bool,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, parameters: impl Into<String>, return_type: Option<String>, is_constructor: bool) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into(),
            return_type,
            is_constructor,
        }
    }

    fn write_signature(&self, class: &str, out: &mut String) {
        out.push_str(&escape_xml(class));
        out.push(' ');
        if !self.is_constructor {
            if let Some(return_type) = &self.return_type {
                out.push_str(&escape_xml(return_type));
                out.push(' ');
            }
        }
        out.push_str(&escape_xml(&self.name));
        out.push('(');
        write_parameter_list(&self.parameters, out);
        out.push(')');
    }
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Class,
    Field {
        name: String,
        field_type: Option<String>,
    },
    Method(MethodSignature),
    Parameter {
        method: MethodSignature,
        index: usize,
    },
}

/// Identity of an item. Return and field types are deliberately absent, so
/// an imported item without type information matches a source item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKey {
    Class(String),
    Field(String, String),
    Method {
        class: String,
        name: String,
        parameters: String,
        is_constructor: bool,
    },
    Parameter {
        class: String,
        name: String,
        parameters: String,
        is_constructor: bool,
        index: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Item {
    pub containing_class: String,
    pub class_kind: ClassKind,
    pub kind: ItemKind,
    pub annotations: Vec<AnnotationData>,
    /// Marked with the keep annotation
    pub keep: bool,
}

impl Item {
    fn with_kind(containing_class: impl Into<String>, class_kind: ClassKind, kind: ItemKind) -> Self {
        Self {
            containing_class: containing_class.into(),
            class_kind,
            kind,
            annotations: Vec::new(),
            keep: false,
        }
    }

    pub fn class(containing_class: impl Into<String>, class_kind: ClassKind) -> Self {
        Self::with_kind(containing_class, class_kind, ItemKind::Class)
    }

    pub fn field(
        containing_class: impl Into<String>,
        class_kind: ClassKind,
        name: impl Into<String>,
        field_type: Option<String>,
    ) -> Self {
        Self::with_kind(
            containing_class,
            class_kind,
            ItemKind::Field {
                name: name.into(),
                field_type,
            },
        )
    }

    pub fn method(containing_class: impl Into<String>, class_kind: ClassKind, method: MethodSignature) -> Self {
        Self::with_kind(containing_class, class_kind, ItemKind::Method(method))
    }

    pub fn parameter(
        containing_class: impl Into<String>,
        class_kind: ClassKind,
        method: MethodSignature,
        index: usize,
    ) -> Self {
        Self::with_kind(containing_class, class_kind, ItemKind::Parameter { method, index })
    }

    pub fn key(&self) -> ItemKey {
        let class = self.containing_class.clone();
        match &self.kind {
            ItemKind::Class => ItemKey::Class(class),
            ItemKind::Field { name, .. } => ItemKey::Field(class, name.clone()),
            ItemKind::Method(method) => ItemKey::Method {
                class,
                name: method.name.clone(),
                parameters: method.parameters.clone(),
                is_constructor: method.is_constructor,
            },
            ItemKind::Parameter { method, index } => ItemKey::Parameter {
                class,
                name: method.name.clone(),
                parameters: method.parameters.clone(),
                is_constructor: method.is_constructor,
                index: *index,
            },
        }
    }

    /// Method name for methods and parameters
    pub fn method_name(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Method(method) | ItemKind::Parameter { method, .. } => Some(&method.name),
            _ => None,
        }
    }

    /// Canonical, XML-escaped signature
    pub fn signature(&self) -> String {
        let mut out = String::new();
        match &self.kind {
            ItemKind::Class => out.push_str(&escape_xml(&self.containing_class)),
            ItemKind::Field { name, .. } => {
                out.push_str(&escape_xml(&self.containing_class));
                out.push(' ');
                out.push_str(name);
            }
            ItemKind::Method(method) => method.write_signature(&self.containing_class, &mut out),
            ItemKind::Parameter { method, index } => {
                method.write_signature(&self.containing_class, &mut out);
                out.push(' ');
                out.push_str(&index.to_string());
            }
        }
        out
    }

    /// Sort key: the signature with entity ampersands folded to dots
    pub fn sort_key(&self) -> String {
        self.signature().replace('&', ".")
    }

    pub fn compare(&self, other: &Item) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }

    /// ProGuard rule keeping this element, if one applies
    pub fn keep_rule(&self) -> Option<String> {
        let kind = self.class_kind.keep_type();
        let class = &self.containing_class;
        match &self.kind {
            ItemKind::Class => Some(format!("-keep {} {}\n", kind, class)),
            ItemKind::Field { name, field_type } => field_type
                .as_ref()
                .map(|field_type| format!("-keep {} {} {{\n    {} {}\n}}\n", kind, class, field_type, name)),
            ItemKind::Method(method) => {
                let member = if method.is_constructor {
                    "<init>".to_string()
                } else {
                    format!(
                        "{} {}",
                        method.return_type.as_deref().unwrap_or("void"),
                        method.name
                    )
                };
                Some(format!(
                    "-keep {} {} {{\n    {}({})\n}}\n",
                    kind, class, member, method.parameters
                ))
            }
            ItemKind::Parameter { .. } => None,
        }
    }

    /// Whether the API database does not know this element
    pub fn is_filtered(&self, api: &ApiDatabase) -> bool {
        match &self.kind {
            ItemKind::Class => !api.has_class(&self.containing_class),
            ItemKind::Field { name, .. } => !api.has_field(&self.containing_class, name),
            ItemKind::Method(method) | ItemKind::Parameter { method, .. } => {
                !api.has_method(&self.containing_class, &method.name, &method.parameters)
            }
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Item {}

/// Render a parameter list: angle brackets escaped, one space after each
/// top-level comma.
fn write_parameter_list(parameters: &str, out: &mut String) {
    let mut balance = 0i32;
    for c in parameters.chars() {
        match c {
            '<' => {
                balance += 1;
                out.push_str("&lt;");
            }
            '>' => {
                balance -= 1;
                out.push_str("&gt;");
            }
            ',' if balance == 0 => out.push_str(", "),
            _ => out.push(c),
        }
    }
}

/// Escape text for use inside a double-quoted XML attribute
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            _ => out.push(c),
        }
    }
    out
}
