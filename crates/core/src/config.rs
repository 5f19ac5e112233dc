//! Configuration file parsing for .callmap.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up from the project root upwards
pub const CONFIG_FILE_NAME: &str = ".callmap.toml";

/// Main configuration structure for .callmap.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallmapConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub ignore: IgnoreConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Used in cache and output file names
    #[serde(default = "default_project_name")]
    pub project_name: String,

    /// Parser threads; 1 parses sequentially
    #[serde(default = "default_workers")]
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IgnoreConfig {
    /// Directory name fragments skipped during discovery
    #[serde(default = "default_ignore_dirs")]
    pub dirs: Vec<String>,

    /// Extra gitignore-style globs
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolveConfig {
    /// Narrow non-native candidates by include/use hints
    #[serde(default)]
    pub import_filter: bool,

    /// Candidate sets larger than this are dropped
    #[serde(default = "default_ambiguity_cap")]
    pub ambiguity_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Relative to the project root
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Output file prefix; `{project}.parsed` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// One file per category instead of a single document
    #[serde(default = "default_true")]
    pub split: bool,

    #[serde(default = "default_true")]
    pub pretty: bool,
}

// Default functions
fn default_project_name() -> String {
    "default_project".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_ambiguity_cap() -> usize {
    10
}

fn default_cache_dir() -> String {
    ".callmap-cache".to_string()
}

fn default_ignore_dirs() -> Vec<String> {
    vec![
        "vendor".to_string(),
        "node_modules".to_string(),
        "temp/compiled".to_string(),
        ".git".to_string(),
        ".callmap-cache".to_string(),
    ]
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            workers: default_workers(),
        }
    }
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            dirs: default_ignore_dirs(),
            paths: Vec::new(),
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            import_filter: false,
            ambiguity_cap: default_ambiguity_cap(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            split: true,
            pretty: true,
        }
    }
}

impl CallmapConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: CallmapConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Find and load .callmap.toml from the given directory or its ancestors
    pub fn find_and_load(start_dir: &Path) -> Result<Self> {
        let mut current = start_dir;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Self::from_file(&config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // No config found, use defaults
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: CallmapConfig = toml::from_str("").unwrap();
        assert_eq!(config, CallmapConfig::default());
        assert_eq!(config.general.workers, 1);
        assert_eq!(config.resolve.ambiguity_cap, 10);
        assert!(config.ignore.dirs.contains(&"temp/compiled".to_string()));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: CallmapConfig = toml::from_str(
            r#"
[resolve]
import_filter = true

[cache]
enabled = false
"#,
        )
        .unwrap();
        assert!(config.resolve.import_filter);
        assert_eq!(config.resolve.ambiguity_cap, 10);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.dir, ".callmap-cache");
        assert!(config.output.split);
    }
}
