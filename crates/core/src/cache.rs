//! Parse-result caching between runs
//!
//! The cache holds the raw per-file extraction output (before repair and
//! resolution), keyed by project name plus a hash of the project root and
//! exclusion list. It is reused only when the tool version and every file
//! checksum still match.

use crate::discovery::relative_path;
use crate::ids::{checksum, short_hash};
use crate::model::{FileFailure, ParsedFile};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Cache read failures the caller has to decide about
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Metadata stored next to the cached parse results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseCacheMeta {
    /// Callmap version that created this cache
    pub version: String,

    /// Relative path -> sha256 of the file contents
    pub file_checksums: BTreeMap<String, String>,

    /// Files that failed to parse when the cache was written
    #[serde(default)]
    pub failures: Vec<FileFailure>,
}

impl ParseCacheMeta {
    pub fn new(file_checksums: BTreeMap<String, String>, failures: Vec<FileFailure>) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            file_checksums,
            failures,
        }
    }
}

/// Manages the on-disk parse cache for one project configuration
pub struct ParseCache {
    cache_dir: PathBuf,
    data_path: PathBuf,
    meta_path: PathBuf,
}

impl ParseCache {
    /// `<cache_dir>/<project>.<hash8(root|excludes)>.parse.json` plus a
    /// sibling `.meta.json`
    pub fn new(cache_dir: &Path, project_name: &str, project_root: &Path, exclude_dirs: &[String]) -> Self {
        let key = short_hash(&format!(
            "{}|{}",
            project_root.display(),
            exclude_dirs.join(",")
        ));
        let stem = format!("{}.{}", project_name, key);
        Self {
            cache_dir: cache_dir.to_path_buf(),
            data_path: cache_dir.join(format!("{}.parse.json", stem)),
            meta_path: cache_dir.join(format!("{}.meta.json", stem)),
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Load cached parse results.
    ///
    /// A missing or empty cache file is `Ok(None)`. Unreadable or
    /// undecodable content is an error.
    pub fn load(&self) -> Result<Option<(BTreeMap<String, ParsedFile>, ParseCacheMeta)>, CacheError> {
        let Some(data) = read_if_present(&self.data_path)? else {
            return Ok(None);
        };
        let Some(meta) = read_if_present(&self.meta_path)? else {
            return Ok(None);
        };

        let files = serde_json::from_str(&data).map_err(|source| CacheError::Corrupt {
            path: self.data_path.clone(),
            source,
        })?;
        let meta = serde_json::from_str(&meta).map_err(|source| CacheError::Corrupt {
            path: self.meta_path.clone(),
            source,
        })?;
        debug!(path = %self.data_path.display(), "loaded parse cache");
        Ok(Some((files, meta)))
    }

    /// Save parse results to the cache
    pub fn save(&self, files: &BTreeMap<String, ParsedFile>, meta: &ParseCacheMeta) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir).context("Failed to create cache directory")?;

        let meta_contents = serde_json::to_string_pretty(meta)?;
        std::fs::write(&self.meta_path, meta_contents)
            .with_context(|| format!("Failed to write {}", self.meta_path.display()))?;

        let data_contents = serde_json::to_string(files)?;
        std::fs::write(&self.data_path, data_contents)
            .with_context(|| format!("Failed to write {}", self.data_path.display()))?;

        Ok(())
    }

    /// Remove this project's cache files
    pub fn clear(&self) -> Result<()> {
        for path in [&self.data_path, &self.meta_path] {
            if path.exists() {
                std::fs::remove_file(path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }

    /// Compute a checksum for a file
    pub fn compute_file_checksum(file_path: &Path) -> Result<String> {
        let contents = std::fs::read(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        Ok(checksum(&contents))
    }

    /// Checksums keyed by relative path. Unreadable files are left out; the
    /// parser reports them as failures.
    pub fn build_file_checksums(root: &Path, files: &[PathBuf]) -> BTreeMap<String, String> {
        files
            .iter()
            .filter_map(|file| match Self::compute_file_checksum(file) {
                Ok(sum) => Some((relative_path(root, file), sum)),
                Err(e) => {
                    warn!("{:#}", e);
                    None
                }
            })
            .collect()
    }

    /// Check if the cache is valid for the current file set
    pub fn is_cache_valid(meta: &ParseCacheMeta, current: &BTreeMap<String, String>) -> bool {
        if meta.version != crate::VERSION {
            debug!(cached = %meta.version, "cache written by another version");
            return false;
        }
        meta.file_checksums == *current
    }
}

fn read_if_present(path: &Path) -> Result<Option<String>, CacheError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| CacheError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(contents))
}
