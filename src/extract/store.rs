// Item store: package -> class -> items, plus the keep list

use crate::api::ApiDatabase;
use crate::model::names::{is_non_null, is_nullable};
use crate::model::{AnnotationData, Item, ItemKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of adding an item to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Stored as a new item carrying this many annotations
    Inserted(usize),
    /// Folded into an existing item; this many annotations were new
    Merged(usize),
    /// Rejected by the API filter
    Filtered,
}

impl AddOutcome {
    pub fn added_annotations(&self) -> usize {
        match self {
            AddOutcome::Inserted(count) | AddOutcome::Merged(count) => *count,
            AddOutcome::Filtered => 0,
        }
    }
}

/// One package worth of items, classes and items sorted
#[derive(Debug)]
pub struct PackageItems<'a> {
    pub package: String,
    pub items: Vec<&'a Item>,
}

#[derive(Debug, Default)]
pub struct ItemStore {
    packages: BTreeMap<String, BTreeMap<String, Vec<Item>>>,
    keep_items: Vec<Item>,
    api: Option<Arc<ApiDatabase>>,
    list_filtered: bool,
    filtered_count: usize,
}

impl ItemStore {
    pub fn new(api: Option<Arc<ApiDatabase>>, list_filtered: bool) -> Self {
        Self {
            api,
            list_filtered,
            ..Default::default()
        }
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_count
    }

    pub fn keep_items(&self) -> &[Item] {
        &self.keep_items
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.packages
            .values()
            .flat_map(|classes| classes.values())
            .map(Vec::len)
            .sum()
    }

    /// Add an item. Keep-marked items are recorded on the keep list even if
    /// the API filter then rejects them. An item equal to a stored one has
    /// its annotations merged into the stored item.
    pub fn add(&mut self, item: Item) -> AddOutcome {
        if item.keep && !self.keep_items.contains(&item) {
            self.keep_items.push(item.clone());
        }

        if let Some(api) = &self.api {
            if item.is_filtered(api) {
                if self.list_filtered {
                    info!("Skipping API because it is not part of the API file: {}", item.signature());
                }
                self.filtered_count += 1;
                return AddOutcome::Filtered;
            }
        }

        let key = item.key();
        if let Some(existing) = self.find_mut(&item.containing_class, &key) {
            let count = merge_annotations(item.annotations, existing);
            return AddOutcome::Merged(count);
        }

        let count = item.annotations.len();
        let package = package_of(&item.containing_class).to_string();
        self.packages
            .entry(package)
            .or_default()
            .entry(item.containing_class.clone())
            .or_default()
            .push(item);
        AddOutcome::Inserted(count)
    }

    pub fn find(&self, class_name: &str, key: &ItemKey) -> Option<&Item> {
        self.packages
            .get(package_of(class_name))?
            .get(class_name)?
            .iter()
            .find(|item| item.key() == *key)
    }

    pub fn find_mut(&mut self, class_name: &str, key: &ItemKey) -> Option<&mut Item> {
        self.packages
            .get_mut(package_of(class_name))?
            .get_mut(class_name)?
            .iter_mut()
            .find(|item| item.key() == *key)
    }

    /// Remove an item, dropping class and package entries that become empty
    pub fn remove(&mut self, class_name: &str, key: &ItemKey) -> Option<Item> {
        let package = package_of(class_name);
        let classes = self.packages.get_mut(package)?;
        let items = classes.get_mut(class_name)?;
        let index = items.iter().position(|item| item.key() == *key)?;
        let removed = items.remove(index);

        if items.is_empty() {
            classes.remove(class_name);
            if classes.is_empty() {
                self.packages.remove(package);
            }
        }
        Some(removed)
    }

    /// Take the keep list. Keep items leave the store entirely and are never
    /// written to the archive.
    pub fn take_keep_items(&mut self) -> Vec<Item> {
        let keep = std::mem::take(&mut self.keep_items);
        for item in &keep {
            self.remove(&item.containing_class, &item.key());
        }
        keep
    }

    /// Packages in name order, each with its items ordered by class name
    /// and then by signature
    pub fn snapshot(&self) -> Vec<PackageItems<'_>> {
        self.packages
            .iter()
            .map(|(package, classes)| {
                let mut items = Vec::new();
                for class_items in classes.values() {
                    let mut sorted: Vec<&Item> = class_items.iter().collect();
                    sorted.sort_by_cached_key(|item| item.sort_key());
                    items.extend(sorted);
                }
                PackageItems {
                    package: package.clone(),
                    items,
                }
            })
            .collect()
    }
}

/// Merge annotations into an existing item. Annotations already present by
/// name are skipped, as are nullness annotations contradicting an existing
/// one. Returns the number of annotations added.
pub fn merge_annotations(annotations: Vec<AnnotationData>, existing: &mut Item) -> usize {
    let mut count = 0;
    for annotation in annotations {
        if existing.annotations.contains(&annotation) {
            continue;
        }
        let have_nullable = existing.annotations.iter().any(|a| is_nullable(&a.name));
        let have_non_null = existing.annotations.iter().any(|a| is_non_null(&a.name));
        if (is_non_null(&annotation.name) && have_nullable) || (is_nullable(&annotation.name) && have_non_null) {
            warn!("Found both @Nullable and @NonNull after import for {}", existing.signature());
            continue;
        }
        existing.annotations.push(annotation);
        count += 1;
    }
    count
}

/// Package of a class: everything before the first `.` followed by an
/// upper case letter, so `foo.bar.Foo.Bar` maps to `foo.bar`.
pub fn package_of(class_name: &str) -> &str {
    let bytes = class_name.as_bytes();
    let mut last = 0;
    for (index, _) in class_name.match_indices('.') {
        last = index;
        if bytes.get(index + 1).is_some_and(|c| c.is_ascii_uppercase()) {
            break;
        }
    }
    &class_name[..last]
}
