// Extraction statistics

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    /// Recorded annotations per portable name
    pub annotations: BTreeMap<String, usize>,
    pub filtered_count: usize,
    pub merged_count: usize,
    /// Annotated items written to the archive
    pub items: usize,
    pub keep_rules: usize,
    pub packages: usize,
    pub failed_packages: Vec<String>,
    pub non_public_typedefs: Vec<String>,
}

impl ExtractionStats {
    pub fn total(&self) -> usize {
        self.annotations.values().sum()
    }

    /// Annotation counts, most frequent first, ties by name
    pub fn by_frequency(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .annotations
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts
    }

    /// The annotation table: simple names right-aligned on `@`
    pub fn summary_table(&self) -> Option<String> {
        if self.annotations.is_empty() {
            return None;
        }

        let counts = self.by_frequency();
        let simple = |name: &str| name.rsplit('.').next().unwrap_or(name).to_string();
        let width = counts.iter().map(|(name, _)| simple(name).len()).max().unwrap_or(0);

        let mut out = format!("Extracted {} Annotations:", self.total());
        for (name, count) in counts {
            let name = simple(name);
            out.push('\n');
            out.push_str(&" ".repeat(width - name.len() + 1));
            out.push_str(&format!("@{}: {}", name, count));
        }
        Some(out)
    }

    pub fn log(&self) {
        if let Some(table) = self.summary_table() {
            info!("{}", table);
        }
        if self.filtered_count > 0 {
            info!("{} of these were filtered out (not in API database file)", self.filtered_count);
        }
        if self.merged_count > 0 {
            info!("{} additional annotations were merged in", self.merged_count);
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).into_diagnostic()?;
        std::fs::write(path, json).into_diagnostic()?;
        Ok(())
    }
}
