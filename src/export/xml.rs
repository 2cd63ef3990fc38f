// External annotations XML writer
//
// One document per package. Output is byte-for-byte deterministic: items
// arrive sorted from the store and attribute order is fixed.

use crate::api::ApiDatabase;
use crate::facts::{AnnotationValue, SourceAttribute};
use crate::model::names::{ATTR_VALUE, INT_DEF, REQUIRES_PERMISSION, STRING_DEF};
use crate::model::{escape_xml, AnnotationData, Attributes, Item};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Write;
use tracing::{info, warn};

pub const DOCUMENT_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n";
pub const DOCUMENT_FOOTER: &str = "</root>\n\n";

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    /// Write `value` first, then the other attributes by name
    pub sort_attributes: bool,
    /// Field references missing from this database are dropped
    pub api: Option<&'a ApiDatabase>,
    pub list_filtered: bool,
}

impl Default for RenderOptions<'_> {
    fn default() -> Self {
        Self {
            sort_attributes: true,
            api: None,
            list_filtered: false,
        }
    }
}

/// Render a whole package document. Items without annotations are skipped.
pub fn write_package_document(items: &[&Item], options: &RenderOptions<'_>) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(DOCUMENT_HEADER);
    for item in items.iter().filter(|item| !item.annotations.is_empty()) {
        write_item(&mut out, item, options);
    }
    out.push_str(DOCUMENT_FOOTER);
    out
}

pub fn write_item(out: &mut String, item: &Item, options: &RenderOptions<'_>) {
    let _ = writeln!(out, "  <item name=\"{}\">", item.signature());
    for annotation in &item.annotations {
        write_annotation(out, annotation, options);
    }
    out.push_str("  </item>\n");
}

fn write_annotation(out: &mut String, annotation: &AnnotationData, options: &RenderOptions<'_>) {
    let name = annotation.name.as_str();
    match &annotation.attributes {
        Attributes::None => {
            let _ = writeln!(out, "    <annotation name=\"{}\" />", name);
        }
        Attributes::Strings(pairs) if !pairs.is_empty() => {
            let _ = writeln!(out, "    <annotation name=\"{}\">", name);
            for (key, value) in pairs {
                write_val(out, key, value);
            }
            out.push_str("    </annotation>\n");
        }
        Attributes::Source(attributes) if !attributes.is_empty() => {
            let _ = writeln!(out, "    <annotation name=\"{}\">", name);

            let mut attributes = attributes.clone();
            if options.sort_attributes && attributes.len() > 1 {
                attributes.sort_by(|a, b| {
                    let (a, b) = (attribute_name(a), attribute_name(b));
                    (a != ATTR_VALUE).cmp(&(b != ATTR_VALUE)).then_with(|| a.cmp(b))
                });
            }

            // @RequiresPermission.Read(@RequiresPermission(..)) is written
            // as if the nested attributes sat on the container
            if attributes.len() == 1 && name.starts_with(REQUIRES_PERMISSION) && name.len() > REQUIRES_PERMISSION.len() {
                if let AnnotationValue::Annotation(nested) = &attributes[0].value {
                    attributes = nested.attributes.clone();
                }
            }

            for attribute in &attributes {
                let mut value = String::new();
                render_value(&mut value, &attribute.value, name, options);
                write_val(out, attribute_name(attribute), &value);
            }
            out.push_str("    </annotation>\n");
        }
        _ => {
            let _ = writeln!(out, "    <annotation name=\"{}\" />", name);
        }
    }
}

fn write_val(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(
        out,
        "      <val name=\"{}\" val=\"{}\" />",
        escape_xml(key),
        escape_xml(value)
    );
}

fn attribute_name(attribute: &SourceAttribute) -> &str {
    attribute.name.as_deref().unwrap_or(ATTR_VALUE)
}

/// Append the textual form of an attribute value. Returns `false` when the
/// value could not be rendered; whatever was appended for it is then
/// meaningless and the caller drops it.
pub fn render_value(out: &mut String, value: &AnnotationValue, annotation: &str, options: &RenderOptions<'_>) -> bool {
    match value {
        AnnotationValue::Array(elements) => {
            out.push('{');
            let start = out.len();
            for element in elements {
                let length = out.len();
                if length > start {
                    out.push_str(", ");
                }
                if !render_value(out, element, annotation, options) {
                    out.truncate(length);
                }
            }
            out.push('}');
            true
        }
        AnnotationValue::FieldRef { class, field, constant } => {
            if let Some(constant) = constant {
                if annotation != INT_DEF && annotation != STRING_DEF {
                    let _ = write!(out, "{}", constant);
                    return true;
                }
            }
            match class {
                Some(class) => {
                    if let Some(api) = options.api {
                        if !api.has_field(class, field) {
                            if options.list_filtered {
                                info!("Filtering out typedef constant {}.{}", class, field);
                            }
                            return false;
                        }
                    }
                    let _ = write!(out, "{}.{}", class, field);
                }
                None => out.push_str(field),
            }
            true
        }
        AnnotationValue::Str(text) => {
            let _ = write!(out, "\"{}\"", text);
            true
        }
        AnnotationValue::Number(text) => {
            out.push_str(text);
            true
        }
        AnnotationValue::Bool(value) => {
            let _ = write!(out, "{}", value);
            true
        }
        AnnotationValue::Null => {
            out.push_str("null");
            true
        }
        AnnotationValue::Constant(constant) => {
            let _ = write!(out, "{}", constant);
            true
        }
        AnnotationValue::Annotation(nested) => {
            warn!(
                "Unexpected nested annotation {} in @{}",
                nested.name.as_deref().unwrap_or("?"),
                annotation
            );
            false
        }
        AnnotationValue::Unsupported(text) => {
            warn!("Unexpected annotation expression {} in @{}", text, annotation);
            false
        }
    }
}

/// Parse a generated document back in
pub fn validate_document(xml: &str) -> Result<(), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.check_end_names(true);
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                check_attributes(&element)?;
                depth += 1;
            }
            Event::Empty(element) => check_attributes(&element)?,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }
    if depth != 0 {
        return Err(quick_xml::Error::UnexpectedEof("unclosed element".to_string()));
    }
    Ok(())
}

fn check_attributes(element: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
    for attr in element.attributes() {
        attr.map_err(quick_xml::Error::from)?.unescape_value()?;
    }
    Ok(())
}
