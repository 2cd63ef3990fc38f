// External annotations archive: one annotations.xml per package

use super::xml::{validate_document, write_package_document, RenderOptions};
use crate::extract::ItemStore;
use crate::model::Item;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write archive {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl ExportError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of an export
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub archive_written: bool,
    pub packages: usize,
    pub items: usize,
    pub keep_rules_written: bool,
    pub keep_rules: usize,
    /// Packages whose document failed validation and were left out
    pub failed_packages: Vec<String>,
}

/// Zip entry holding the annotations of a package
pub fn entry_name(package: &str) -> String {
    if package.is_empty() {
        "annotations.xml".to_string()
    } else {
        format!("{}/annotations.xml", package.replace('.', "/"))
    }
}

/// Write the store into an annotations archive. A store without annotated
/// items deletes a stale archive instead.
pub fn write_archive(path: &Path, store: &ItemStore, options: &RenderOptions<'_>) -> Result<ExportSummary, ExportError> {
    let mut summary = ExportSummary::default();

    let packages: Vec<(String, Vec<&Item>)> = store
        .snapshot()
        .into_iter()
        .map(|package| {
            let items: Vec<&Item> = package
                .items
                .into_iter()
                .filter(|item| !item.annotations.is_empty())
                .collect();
            (package.package, items)
        })
        .filter(|(_, items)| !items.is_empty())
        .collect();

    if packages.is_empty() {
        if path.exists() {
            debug!("Removing stale annotations archive {}", path.display());
            fs::remove_file(path).map_err(|e| ExportError::io(path, e))?;
        }
        return Ok(summary);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ExportError::io(path, e))?;
    }

    let zip_error = |source| ExportError::Zip {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut writer = ZipWriter::new(file);
    let file_options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (package, items) in packages {
        let name = entry_name(&package);
        let xml = write_package_document(&items, options);

        if let Err(e) = validate_document(&xml) {
            error!(
                "Could not parse XML document back in for entry {}: {}\n\"\"\"\n{}\n\"\"\"",
                name, e, xml
            );
            summary.failed_packages.push(package);
            continue;
        }

        writer.start_file(name, file_options).map_err(zip_error)?;
        writer.write_all(xml.as_bytes()).map_err(|e| ExportError::io(path, e))?;
        summary.packages += 1;
        summary.items += items.len();
    }

    writer.finish().map_err(zip_error)?;
    summary.archive_written = true;
    Ok(summary)
}
