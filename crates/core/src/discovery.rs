//! File discovery with gitignore-aware filtering
//!
//! Uses the `ignore` crate (from ripgrep) to automatically respect
//! `.gitignore`, `.ignore`, and `.git/info/exclude` files. On top of that,
//! directories matching a configured name fragment (`vendor`,
//! `temp/compiled`, ...) are pruned before they are descended into.

use anyhow::{Context, Result};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Discover files under `root` matching any of the given `extensions`.
///
/// `ignore_patterns` are gitignore-style globs applied as excludes;
/// `exclude_dirs` are directory fragments matched against whole path
/// components. Returns absolute paths sorted alphabetically.
pub fn discover_files(
    root: &Path,
    extensions: &[&str],
    ignore_patterns: &[String],
    exclude_dirs: &[String],
) -> Result<Vec<PathBuf>> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Cannot access project path {}", root.display()))?;

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(true) // skip hidden files/dirs
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);

    // Negated overrides act as excludes
    if !ignore_patterns.is_empty() {
        let mut overrides = OverrideBuilder::new(&root);
        for pattern in ignore_patterns {
            let glob = if pattern.ends_with('/') {
                format!("!{}**", pattern)
            } else {
                format!("!{}", pattern)
            };
            overrides.add(&glob)?;
        }
        builder.overrides(overrides.build()?);
    }

    let fragments: Vec<String> = exclude_dirs
        .iter()
        .map(|f| f.trim_matches(|c| c == '/' || c == '\\').replace('\\', "/"))
        .filter(|f| !f.is_empty())
        .collect();
    if !fragments.is_empty() {
        let walk_root = root.clone();
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !is_dir || !is_excluded_dir(&relative_path(&walk_root, entry.path()), &fragments)
        });
    }

    let mut files = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue, // skip unreadable entries
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.into_path();
        if has_supported_extension(&path, extensions) {
            if path.is_absolute() {
                files.push(path);
            } else {
                files.push(root.join(path));
            }
        }
    }

    files.sort();
    Ok(files)
}

/// `file` relative to `root`, with `/` separators.
///
/// Falls back to the path as given when it does not live under `root`.
pub fn relative_path(root: &Path, file: &Path) -> String {
    let relative = file
        .strip_prefix(root)
        .ok()
        .map(Path::to_path_buf)
        .or_else(|| {
            let root = root.canonicalize().ok()?;
            file.strip_prefix(&root).ok().map(Path::to_path_buf)
        })
        .unwrap_or_else(|| file.to_path_buf());
    relative.to_string_lossy().replace('\\', "/")
}

/// Whether any fragment appears as a run of whole components in `relative`.
fn is_excluded_dir(relative: &str, fragments: &[String]) -> bool {
    if relative.is_empty() {
        return false;
    }
    let padded = format!("/{}/", relative);
    fragments
        .iter()
        .any(|fragment| padded.contains(&format!("/{}/", fragment)))
}

fn has_supported_extension(path: &Path, extensions: &[&str]) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return false,
    };
    let with_dot = format!(".{}", ext.to_ascii_lowercase());
    extensions.contains(&with_dot.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_dir_matches_whole_components() {
        let fragments = vec!["vendor".to_string(), "temp/compiled".to_string()];
        assert!(is_excluded_dir("vendor", &fragments));
        assert!(is_excluded_dir("lib/vendor/pkg", &fragments));
        assert!(is_excluded_dir("app/temp/compiled", &fragments));
        assert!(!is_excluded_dir("vendors", &fragments));
        assert!(!is_excluded_dir("app/temp", &fragments));
        assert!(!is_excluded_dir("", &fragments));
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/project");
        assert_eq!(relative_path(root, Path::new("/project/src/a.php")), "src/a.php");
        assert_eq!(relative_path(root, Path::new("/elsewhere/b.php")), "/elsewhere/b.php");
    }
}
