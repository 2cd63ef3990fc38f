// Configuration loader

use crate::extract::ExtractOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names probed in the project root when no config is given
const DEFAULT_NAMES: &[&str] = &[
    ".annotextract.yml",
    ".annotextract.yaml",
    ".annotextract.toml",
    "annotextract.yml",
    "annotextract.toml",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML config {path}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to parse TOML config {path}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Nothing to write: give an annotations archive (--output) or a keep rules file (--proguard)")]
    NoOutput,
}

/// Configuration for an extraction run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source roots to scan for Java files
    pub sources: Vec<PathBuf>,

    /// Patterns to exclude from scanning
    pub exclude: Vec<String>,

    /// Existing annotation files, archives or directories to merge in
    pub merge: Vec<PathBuf>,

    /// API signature files; when given, only listed elements are written
    pub api_filter: Vec<PathBuf>,

    /// External annotations archive to write
    pub output: Option<PathBuf>,

    /// ProGuard keep rules file to write
    pub proguard: Option<PathBuf>,

    /// Extraction statistics as JSON
    pub stats_json: Option<PathBuf>,

    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Record class-retention support annotations too
    pub include_class_retention: bool,

    /// Write the `value` attribute of each annotation first
    pub sort_annotations: bool,

    /// Log elements dropped by the API filter
    pub list_filtered: bool,

    /// Continue when source files have syntax errors
    pub allow_errors: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_class_retention: true,
            sort_annotations: true,
            list_filtered: true,
            allow_errors: false,
        }
    }
}

impl ExtractionConfig {
    pub fn options(&self, display_info: bool) -> ExtractOptions {
        ExtractOptions {
            include_class_retention: self.include_class_retention,
            sort_annotations: self.sort_annotations,
            list_filtered: self.list_filtered,
            display_info,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_yaml = |contents: &str| {
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        };
        let parse_toml = |contents: &str| {
            toml::from_str(contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        };

        match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "yml" | "yaml" => parse_yaml(&contents),
            "toml" => parse_toml(&contents),
            // Try YAML first, then TOML
            _ => parse_yaml(&contents).or_else(|_| parse_toml(&contents)),
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self, ConfigError> {
        for name in DEFAULT_NAMES {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Check if a path matches one of the exclusion patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|pattern| glob_match(pattern, &path_str))
    }

    /// A run must write at least one of the archive and the keep rules
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.is_none() && self.proguard.is_none() {
            return Err(ConfigError::NoOutput);
        }
        Ok(())
    }
}

/// Simple glob matching for patterns like "*Test.java" or "**/generated/**"
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern.starts_with('*') && !pattern.contains('/') {
        // "*Test.java" matches "src/FooTest.java"
        return text.ends_with(&pattern[1..]);
    }

    if pattern.ends_with('*') && !pattern.contains('/') {
        return text.starts_with(&pattern[..pattern.len() - 1]);
    }

    if pattern.contains("**") {
        // "**/test/**" must match a complete directory name
        if pattern.starts_with("**/") && pattern.ends_with("/**") {
            let dir_name = pattern.trim_start_matches("**/").trim_end_matches("/**");
            return text.contains(&format!("/{}/", dir_name)) || text.starts_with(&format!("{}/", dir_name));
        }

        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if prefix.is_empty() && suffix.is_empty() {
                return true;
            }
            if prefix.is_empty() {
                return text.ends_with(suffix) || text.contains(&format!("/{}", suffix));
            }
            if suffix.is_empty() {
                return text.starts_with(prefix) || text.contains(&format!("{}/", prefix));
            }
            return (text.starts_with(prefix) || text.contains(&format!("/{}/", prefix)))
                && (text.ends_with(suffix) || text.contains(&format!("/{}", suffix)));
        }
    }

    text == pattern
}
