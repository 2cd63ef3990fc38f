// ProGuard/R8 keep rules for elements marked with @Keep

use crate::export::ExportError;
use crate::model::Item;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Render keep rules sorted by item signature, each followed by a blank line
pub fn render_keep_rules(items: &[Item]) -> String {
    let mut sorted: Vec<&Item> = items.iter().collect();
    sorted.sort_by(|a, b| a.compare(b));

    let mut out = String::new();
    for rule in sorted.into_iter().filter_map(Item::keep_rule) {
        out.push_str(&rule);
        out.push('\n');
    }
    out
}

/// Write the keep rules file. Without keep items a stale file is deleted.
/// Returns the number of rules written.
pub fn write_keep_rules(path: &Path, items: &[Item]) -> Result<usize, ExportError> {
    if items.is_empty() {
        if path.exists() {
            debug!("Removing stale keep rules {}", path.display());
            fs::remove_file(path).map_err(|e| ExportError::io(path, e))?;
        }
        return Ok(0);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ExportError::io(path, e))?;
    }

    let rules = render_keep_rules(items);
    let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(rules.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| ExportError::io(path, e))?;

    Ok(items.iter().filter(|item| item.keep_rule().is_some()).count())
}
