//! JSON artifacts written after resolution

use crate::model::{CallSite, ClassRecord, MethodRecord, ParsedFile};
use crate::pipeline::AnalysisResult;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One split-output artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Method,
    Class,
    Import,
    Namespace,
    Variable,
    Called,
}

impl Category {
    /// Suffix used in `{prefix}.{category}.json`
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Method => "method",
            Category::Class => "class",
            Category::Import => "import",
            Category::Namespace => "namespace",
            Category::Variable => "variable",
            Category::Called => "called",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories written when output is split, in write order
pub const CATEGORIES: &[Category] = &[
    Category::Method,
    Category::Class,
    Category::Import,
    Category::Namespace,
    Category::Variable,
    Category::Called,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    /// One file per category instead of a single document
    pub split: bool,
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            split: true,
            pretty: true,
        }
    }
}

/// Call sites of one declaration, as written to the `called` category
#[derive(Debug, Serialize)]
pub struct CalledEntry<'a> {
    pub id: &'a str,
    pub fullname: &'a str,
    pub calls: &'a [CallSite],
}

/// Default output prefix for a project: `{project}.parsed`
pub fn default_prefix(project_name: &str) -> String {
    format!("{}.parsed", project_name)
}

/// Write the artifacts and return the paths written.
///
/// Split output produces `{prefix}.{category}.json` per category, each a map
/// of relative file path to that file's records; files with nothing in a
/// category are left out. Unsplit output is one `{prefix}.json` with the
/// full per-file map.
pub fn write_outputs(result: &AnalysisResult, prefix: &str, options: OutputOptions) -> Result<Vec<PathBuf>> {
    if !options.split {
        let path = PathBuf::from(format!("{}.json", prefix));
        write_json(&path, &result.files, options.pretty)?;
        return Ok(vec![path]);
    }

    let mut written = Vec::new();
    for category in CATEGORIES {
        let path = PathBuf::from(format!("{}.{}.json", prefix, category));
        let files = &result.files;
        match category {
            Category::Method => write_json(&path, &per_file(files, method_view), options.pretty)?,
            Category::Class => write_json(&path, &per_file(files, class_view), options.pretty)?,
            Category::Import => write_json(&path, &per_file(files, |f| f.imports.clone()), options.pretty)?,
            Category::Namespace => {
                write_json(&path, &per_file(files, |f| f.namespaces.clone()), options.pretty)?
            }
            Category::Variable => {
                write_json(&path, &per_file(files, |f| f.variables.clone()), options.pretty)?
            }
            Category::Called => write_json(&path, &per_file(files, called_view), options.pretty)?,
        }
        written.push(path);
    }
    Ok(written)
}

/// Apply `view` to every file, keeping non-empty results only.
fn per_file<'a, T>(
    files: &'a BTreeMap<String, ParsedFile>,
    view: impl Fn(&'a ParsedFile) -> Vec<T>,
) -> BTreeMap<&'a str, Vec<T>> {
    files
        .iter()
        .map(|(path, file)| (path.as_str(), view(file)))
        .filter(|(_, records)| !records.is_empty())
        .collect()
}

/// Declarations without their call lists; `called_by` stays.
fn method_view(file: &ParsedFile) -> Vec<MethodRecord> {
    file.declarations().map(without_calls).collect()
}

fn class_view(file: &ParsedFile) -> Vec<ClassRecord> {
    file.classes
        .iter()
        .map(|class| ClassRecord {
            methods: class.methods.iter().map(without_calls).collect(),
            ..class.clone()
        })
        .collect()
}

fn called_view(file: &ParsedFile) -> Vec<CalledEntry<'_>> {
    file.declarations()
        .filter(|d| !d.calls.is_empty())
        .map(|d| CalledEntry {
            id: &d.id,
            fullname: &d.fullname,
            calls: &d.calls,
        })
        .collect()
}

fn without_calls(method: &MethodRecord) -> MethodRecord {
    MethodRecord {
        calls: Vec::new(),
        ..method.clone()
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
