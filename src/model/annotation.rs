// Normalized annotation payload attached to items

use crate::facts::SourceAttribute;

/// Attribute payload of an annotation. Imported and typedef-expanded
/// annotations carry rendered strings; source annotations keep their value
/// pairs and are rendered at export time.
#[derive(Debug, Clone, Default)]
pub enum Attributes {
    #[default]
    None,
    Strings(Vec<(String, String)>),
    Source(Vec<SourceAttribute>),
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        match self {
            Attributes::None => true,
            Attributes::Strings(pairs) => pairs.is_empty(),
            Attributes::Source(pairs) => pairs.is_empty(),
        }
    }
}

/// An annotation in the portable namespace. Two annotations are equal when
/// their names are; attributes never participate in equality.
#[derive(Debug, Clone)]
pub struct AnnotationData {
    pub name: String,
    pub attributes: Attributes,
}

impl AnnotationData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::None,
        }
    }

    pub fn with_strings(name: impl Into<String>, pairs: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::Strings(pairs),
        }
    }

    pub fn with_source(name: impl Into<String>, pairs: Vec<SourceAttribute>) -> Self {
        let attributes = if pairs.is_empty() {
            Attributes::None
        } else {
            Attributes::Source(pairs)
        };
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Look up a rendered string attribute
    pub fn string_attribute(&self, key: &str) -> Option<&str> {
        match &self.attributes {
            Attributes::Strings(pairs) => pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for AnnotationData {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AnnotationData {}
