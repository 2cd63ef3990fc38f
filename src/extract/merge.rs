// Import of previously exported external annotations
//
// Sources are annotation XML files, directories holding them, or archives
// (.jar/.zip) whose *.xml entries are annotation documents. Every relevant
// annotation is converted to the portable namespace and folded into the
// item store.

use super::store::ItemStore;
use super::typedefs::expand_values_from_class;
use crate::api::ApiDatabase;
use crate::facts::TypedefFacts;
use crate::model::names::{
    is_non_null, is_nullable, ANDROID_ANNOTATIONS_PREFIX, ANDROID_INT_DEF, ANDROID_STRING_DEF, ATTR_FLAG,
    ATTR_NAME, ATTR_VAL, ATTR_VALUE, IDEA_CONTRACT, IDEA_MAGIC, IDEA_NON_NLS, IDEA_NULLABLE, INT_DEF,
    STRING_DEF, SUPPORT_ANNOTATIONS_PREFIX, SUPPORT_NOTNULL, SUPPORT_NULLABLE, VALUE_TRUE,
};
use crate::model::{AnnotationData, ClassKind, Item, MethodSignature};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Signature of an annotated item: `Class (Field | [Type] Name(Args) [Index])`.
/// The method alternative comes first so `pkg.Foo Foo()` is read as a
/// constructor rather than a field named `Foo()`.
const ITEM_SIGNATURE: &str = r"^(\S+) (((.*)\s+)?(\S+)\((.*)\)( \d+)?|\S+)$";

const BROKEN_SORT_SIGNATURE: &str = "java.util.Arrays void sort(T[], java.util.Comparator<?) 0";
const FIXED_SORT_SIGNATURE: &str = "java.util.Arrays void sort(T[], java.util.Comparator<?>) 0";

const DOT_CLASS: &str = ".class";

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name}: XML error at byte {position}: {source}")]
    Xml {
        source_name: String,
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("failed to read archive {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{source_name}: expected <root> document element, found <{found}>")]
    UnexpectedRoot { source_name: String, found: String },
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// An `<item>` element of an annotations document
#[derive(Debug, Default)]
struct XmlItem {
    signature: Option<String>,
    annotations: Vec<XmlAnnotation>,
}

/// An `<annotation>` element with its `<val name=.. val=..>` children
#[derive(Debug, Default)]
struct XmlAnnotation {
    name: String,
    values: Vec<(String, String)>,
}

pub struct MergeEngine {
    api: Option<Arc<ApiDatabase>>,
    facts: Arc<TypedefFacts>,
    list_filtered: bool,
    signature: Regex,
    ignored: HashSet<String>,
    merged_count: usize,
}

impl MergeEngine {
    pub fn new(api: Option<Arc<ApiDatabase>>, facts: Arc<TypedefFacts>, list_filtered: bool) -> Self {
        Self {
            api,
            facts,
            list_filtered,
            signature: Regex::new(ITEM_SIGNATURE).unwrap(),
            ignored: HashSet::new(),
            merged_count: 0,
        }
    }

    /// Number of annotations added by imports so far
    pub fn merged_count(&self) -> usize {
        self.merged_count
    }

    /// Merge a directory, archive or XML file. Failures are logged and the
    /// offending source skipped. Returns the number of annotations added.
    pub fn merge_path(&mut self, path: &Path, store: &mut ItemStore) -> usize {
        let before = self.merged_count;

        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                self.merge_file(entry.path(), store);
            }
        } else if path.is_file() {
            self.merge_file(path, store);
        } else {
            warn!("Merge source does not exist: {}", path.display());
        }

        self.merged_count - before
    }

    fn merge_file(&mut self, path: &Path, store: &mut ItemStore) {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let result = match extension {
            "jar" | "zip" => self.merge_archive(path, store),
            "xml" => fs::read_to_string(path)
                .map_err(|source| MergeError::Io {
                    path: path.to_path_buf(),
                    source,
                })
                .and_then(|xml| self.merge_document(&path.display().to_string(), &xml, store)),
            _ => return,
        };

        if let Err(e) = result {
            error!("Failed to merge {}: {}", path.display(), e);
        }
    }

    fn merge_archive(&mut self, path: &Path, store: &mut ItemStore) -> Result<usize> {
        let zip_error = |source| MergeError::Zip {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(|source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = zip::ZipArchive::new(file).map_err(zip_error)?;

        let mut count = 0;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(zip_error)?;
            if entry.is_dir() || !entry.name().ends_with(".xml") {
                continue;
            }
            let source_name = format!("{}: {}", path.display(), entry.name());
            let mut xml = String::new();
            entry.read_to_string(&mut xml).map_err(|source| MergeError::Io {
                path: path.to_path_buf(),
                source,
            })?;

            // A broken entry does not spoil the rest of the archive
            match self.merge_document(&source_name, &xml, store) {
                Ok(added) => count += added,
                Err(e) => error!("Failed to merge {}", e),
            }
        }
        Ok(count)
    }

    /// Merge one annotations document. Returns the number of annotations added.
    pub fn merge_document(&mut self, source_name: &str, xml: &str, store: &mut ItemStore) -> Result<usize> {
        let items = parse_document(source_name, xml)?;
        let before = self.merged_count;
        for item in items {
            self.merge_item(item, store);
        }
        Ok(self.merged_count - before)
    }

    fn merge_item(&mut self, item: XmlItem, store: &mut ItemStore) {
        let Some(mut signature) = item.signature else {
            return;
        };
        if signature == "null" {
            return;
        }

        let annotations: Vec<AnnotationData> = item
            .annotations
            .iter()
            .filter_map(|annotation| self.import_relevant(annotation))
            .collect();
        if annotations.is_empty() {
            return;
        }

        if signature == BROKEN_SORT_SIGNATURE {
            signature = FIXED_SORT_SIGNATURE.to_string();
        }

        let Some(captures) = self.signature.captures(&signature) else {
            if signature.contains(' ') || !signature.contains('.') {
                warn!("No merge match for signature {}", signature);
            }
            return;
        };

        let containing_class = captures[1].to_string();
        let mut imported = match captures.get(5) {
            Some(method_name) => {
                let method_name = method_name.as_str();
                let return_type = captures.get(4).map(|m| m.as_str().trim().to_string());
                let is_constructor = return_type.is_none();
                let parameters = fix_parameter_string(captures.get(6).map_or("", |m| m.as_str()));
                let method = MethodSignature::new(method_name, parameters, return_type, is_constructor);

                match captures.get(7) {
                    Some(index) => {
                        let Ok(index) = index.as_str().trim().parse::<usize>() else {
                            warn!("Invalid parameter index in signature {}", signature);
                            return;
                        };
                        // Calendar.set(int, int, int...) metadata is wrong past the first argument
                        if containing_class == "java.util.Calendar" && method_name == "set" && index > 0 {
                            return;
                        }
                        Item::parameter(&containing_class, ClassKind::Class, method, index)
                    }
                    None => Item::method(&containing_class, ClassKind::Class, method),
                }
            }
            None => Item::field(&containing_class, ClassKind::Class, &captures[2], None),
        };

        imported.annotations = annotations;
        self.merged_count += store.add(imported).added_annotations();
    }

    fn import_relevant(&mut self, element: &XmlAnnotation) -> Option<AnnotationData> {
        let annotation = self.import_annotation(element)?;
        let name = annotation.name.as_str();

        if is_nullable(name)
            || is_non_null(name)
            || name.starts_with(ANDROID_ANNOTATIONS_PREFIX)
            || name.starts_with(SUPPORT_ANNOTATIONS_PREFIX)
            || name == IDEA_CONTRACT
        {
            return Some(annotation);
        }

        if name != IDEA_NON_NLS && self.ignored.insert(name.to_string()) {
            if self.list_filtered {
                info!("(Ignoring merge annotation {})", name);
            } else {
                debug!("Ignoring merge annotation {}", name);
            }
        }
        None
    }

    /// Convert an imported annotation element to the portable namespace.
    /// Returns `None` for annotations that cannot be imported.
    fn import_annotation(&self, element: &XmlAnnotation) -> Option<AnnotationData> {
        let name = element.name.as_str();

        if name == IDEA_MAGIC {
            let (val_name, value) = element.values.first()?;
            let flags_from_class = val_name == "flagsFromClass";
            let flag = val_name == "flags" || flags_from_class;

            let mut value = value.clone();
            if val_name == "valuesFromClass" || flags_from_class {
                let class_name = value.strip_suffix(DOT_CLASS)?;
                let declared = self.facts.int_fields.get(class_name).map(Vec::as_slice);
                value = expand_values_from_class(class_name, self.api.as_deref(), declared)?;
            }

            if let Some(api) = &self.api {
                value = remove_filtered(&value, api, self.list_filtered);
            }

            let container = if val_name == "stringValues" { STRING_DEF } else { INT_DEF };
            return Some(typedef_annotation(container, value, flag));
        }

        if matches!(name, INT_DEF | ANDROID_INT_DEF | STRING_DEF | ANDROID_STRING_DEF) {
            let (_, value) = element.values.first()?;
            let flag = element
                .values
                .get(1)
                .is_some_and(|(key, val)| key == ATTR_FLAG && val == VALUE_TRUE);
            let container = if matches!(name, INT_DEF | ANDROID_INT_DEF) { INT_DEF } else { STRING_DEF };
            return Some(typedef_annotation(container, value.clone(), flag));
        }

        if name == IDEA_CONTRACT {
            return Some(match element.values.first() {
                Some((_, value)) => {
                    AnnotationData::with_strings(IDEA_CONTRACT, vec![(ATTR_VALUE.to_string(), value.clone())])
                }
                None => AnnotationData::new(IDEA_CONTRACT),
            });
        }

        if is_non_null(name) {
            return Some(AnnotationData::new(SUPPORT_NOTNULL));
        }

        if is_nullable(name) {
            // Inferred nullability is too noisy to import
            if name == IDEA_NULLABLE {
                return None;
            }
            return Some(AnnotationData::new(SUPPORT_NULLABLE));
        }

        if element.values.is_empty() {
            Some(AnnotationData::new(name))
        } else {
            Some(AnnotationData::with_strings(name, element.values.clone()))
        }
    }
}

fn typedef_annotation(container: &str, value: String, flag: bool) -> AnnotationData {
    let mut pairs = vec![(ATTR_VALUE.to_string(), value)];
    if flag {
        pairs.push((ATTR_FLAG.to_string(), VALUE_TRUE.to_string()));
    }
    AnnotationData::with_strings(container, pairs)
}

/// Normalize an imported parameter list to the stored spelling: no doubled
/// spaces and no space after commas. Spaces around `extends` survive.
pub fn fix_parameter_string(parameters: &str) -> String {
    parameters.replace("  ", " ").replace(", ", ",")
}

/// Drop `Class.FIELD` entries of a `{..}` constant list that the API
/// database does not declare. String literals and bare names are kept.
pub fn remove_filtered(value: &str, api: &ApiDatabase, list_filtered: bool) -> String {
    let inner = value.trim();
    let inner = inner.strip_prefix('{').unwrap_or(inner);
    let inner = inner.strip_suffix('}').unwrap_or(inner);

    let mut kept: Vec<&str> = Vec::new();
    for entry in inner.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if entry.starts_with('"') {
            kept.push(entry);
            continue;
        }
        let Some(index) = entry.rfind('.') else {
            kept.push(entry);
            continue;
        };
        let (class_name, field) = (&entry[..index], &entry[index + 1..]);
        if api.has_field(class_name, field) {
            kept.push(entry);
        } else if list_filtered {
            info!("Skipping constant from typedef because it is not part of the SDK: {}", entry);
        }
    }

    format!("{{{}}}", kept.join(", "))
}

fn parse_document(source_name: &str, xml: &str) -> Result<Vec<XmlItem>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    reader.check_end_names(true);

    let mut items = Vec::new();
    let mut current: Option<XmlItem> = None;
    let mut seen_root = false;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| xml_error(source_name, reader.buffer_position(), e))?;
        let (element, is_empty) = match &event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                buf.clear();
                continue;
            }
            Event::Eof => break,
            _ => {
                buf.clear();
                continue;
            }
        };

        let tag = String::from_utf8_lossy(element.name().as_ref()).to_string();
        if !seen_root {
            if tag != "root" {
                return Err(MergeError::UnexpectedRoot {
                    source_name: source_name.to_string(),
                    found: tag,
                });
            }
            seen_root = true;
            buf.clear();
            continue;
        }

        match tag.as_str() {
            "item" => {
                let item = XmlItem {
                    signature: attribute(element, ATTR_NAME).map_err(|e| xml_error(source_name, reader.buffer_position(), e))?,
                    annotations: Vec::new(),
                };
                if is_empty {
                    items.push(item);
                } else {
                    current = Some(item);
                }
            }
            "annotation" => {
                let name = attribute(element, ATTR_NAME).map_err(|e| xml_error(source_name, reader.buffer_position(), e))?;
                if let (Some(item), Some(name)) = (current.as_mut(), name) {
                    item.annotations.push(XmlAnnotation {
                        name,
                        values: Vec::new(),
                    });
                }
            }
            "val" => {
                let name = attribute(element, ATTR_NAME).map_err(|e| xml_error(source_name, reader.buffer_position(), e))?;
                let value = attribute(element, ATTR_VAL).map_err(|e| xml_error(source_name, reader.buffer_position(), e))?;
                if let Some(annotation) = current.as_mut().and_then(|item| item.annotations.last_mut()) {
                    annotation
                        .values
                        .push((name.unwrap_or_default(), value.unwrap_or_default()));
                }
            }
            other => debug!("{}: ignoring <{}> element", source_name, other),
        }
        buf.clear();
    }

    Ok(items)
}

fn xml_error(source_name: &str, position: usize, source: quick_xml::Error) -> MergeError {
    MergeError::Xml {
        source_name: source_name.to_string(),
        position,
        source,
    }
}

fn attribute(element: &BytesStart<'_>, key: &str) -> std::result::Result<Option<String>, quick_xml::Error> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
