// Java source discovery

use crate::config::Config;
use ignore::WalkBuilder;
use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A discovered Java source file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    pub path: PathBuf,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn read_contents(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", self.path.display()))
    }
}

/// File finder for the Java sources of an extraction run
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find all Java files under the configured source roots, or under
    /// `root` when none are configured. Results are sorted by path.
    pub fn find_files(&self, root: &Path) -> Vec<SourceFile> {
        debug!("Scanning for files in: {}", root.display());

        let targets: Vec<PathBuf> = if self.config.sources.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.config.sources.iter().map(|s| root.join(s)).collect()
        };

        let mut files: Vec<SourceFile> = targets
            .par_iter()
            .flat_map(|target| self.scan(target))
            .collect();
        files.sort();
        files.dedup();

        debug!("Found {} files", files.len());
        files
    }

    /// Scan one source root; a root may also be a single file
    fn scan(&self, target: &Path) -> Vec<SourceFile> {
        if !target.exists() {
            trace!("Source root does not exist: {}", target.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(target)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .follow_links(false)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("java") {
                    return None;
                }
                if self.config.should_exclude(path) {
                    trace!("Excluding: {}", path.display());
                    return None;
                }
                Some(SourceFile::new(path.to_path_buf()))
            })
            .collect()
    }
}
