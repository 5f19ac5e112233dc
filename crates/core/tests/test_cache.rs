//! Tests for parse-result caching

use callmap_core::model::FileFailure;
use callmap_core::{CacheError, ParseCache, ParseCacheMeta, ParsedFile, PhpParser};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;

fn sample_files() -> BTreeMap<String, ParsedFile> {
    let parser = PhpParser::new().unwrap();
    let parsed = parser
        .parse_source("<?php\nfunction foo() {}\nfoo();\n")
        .unwrap();
    BTreeMap::from([("a.php".to_string(), parsed)])
}

fn cache_in(dir: &TempDir) -> ParseCache {
    ParseCache::new(&dir.path().join("cache"), "demo", dir.path(), &[])
}

#[test]
fn test_load_without_cache_is_none() {
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);
    assert!(cache.load().unwrap().is_none());
}

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);

    let files = sample_files();
    let checksums = BTreeMap::from([("a.php".to_string(), "abc123".to_string())]);
    let failures = vec![FileFailure {
        path: "broken.php".to_string(),
        error: "Failed to read file".to_string(),
    }];
    let meta = ParseCacheMeta::new(checksums.clone(), failures.clone());
    cache.save(&files, &meta).unwrap();

    let (loaded, loaded_meta) = cache.load().unwrap().expect("cache present");
    assert_eq!(loaded, files);
    assert_eq!(loaded_meta.file_checksums, checksums);
    assert_eq!(loaded_meta.failures, failures);
    assert_eq!(loaded_meta.version, callmap_core::VERSION);
}

#[test]
fn test_cache_file_names() {
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);

    let name = cache
        .data_path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();
    assert!(name.starts_with("demo."));
    assert!(name.ends_with(".parse.json"));

    // a different exclusion list gets its own cache
    let other = ParseCache::new(
        &temp_dir.path().join("cache"),
        "demo",
        temp_dir.path(),
        &["vendor".to_string()],
    );
    assert_ne!(cache.data_path(), other.data_path());
}

#[test]
fn test_corrupt_cache_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);
    cache
        .save(&sample_files(), &ParseCacheMeta::new(BTreeMap::new(), vec![]))
        .unwrap();

    std::fs::write(cache.data_path(), "{ not json").unwrap();

    match cache.load() {
        Err(CacheError::Corrupt { path, .. }) => assert_eq!(path, cache.data_path()),
        other => panic!("expected a corrupt-cache error, got {:?}", other.map(|c| c.is_some())),
    }
}

#[test]
fn test_empty_cache_file_is_treated_as_missing() {
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);
    cache
        .save(&sample_files(), &ParseCacheMeta::new(BTreeMap::new(), vec![]))
        .unwrap();

    std::fs::write(cache.data_path(), "").unwrap();
    assert!(cache.load().unwrap().is_none());
}

#[test]
fn test_clear_removes_cache() {
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);
    cache
        .save(&sample_files(), &ParseCacheMeta::new(BTreeMap::new(), vec![]))
        .unwrap();
    assert!(cache.data_path().exists());

    cache.clear().unwrap();
    assert!(!cache.data_path().exists());
    assert!(cache.load().unwrap().is_none());

    // clearing twice is fine
    cache.clear().unwrap();
}

#[test]
fn test_file_checksums_and_validity() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let file = root.join("a.php");
    std::fs::write(&file, "<?php\necho 1;\n").unwrap();

    let files = vec![file.clone(), root.join("missing.php")];
    let checksums = ParseCache::build_file_checksums(&root, &files);
    assert_eq!(checksums.len(), 1, "unreadable files are left out");
    assert_eq!(checksums["a.php"].len(), 64);

    let meta = ParseCacheMeta::new(checksums.clone(), vec![]);
    assert!(ParseCache::is_cache_valid(&meta, &checksums));

    std::fs::write(&file, "<?php\necho 2;\n").unwrap();
    let changed = ParseCache::build_file_checksums(&root, &files);
    assert!(!ParseCache::is_cache_valid(&meta, &changed));

    let mut added = checksums.clone();
    added.insert("b.php".to_string(), "0".repeat(64));
    assert!(!ParseCache::is_cache_valid(&meta, &added));
}

#[test]
fn test_cache_from_another_version_is_stale() {
    let checksums = BTreeMap::from([("a.php".to_string(), "abc".to_string())]);
    let mut meta = ParseCacheMeta::new(checksums.clone(), vec![]);
    meta.version = "0.0.0-old".to_string();
    assert!(!ParseCache::is_cache_valid(&meta, &checksums));
}

#[test]
fn test_checksum_of_missing_file_fails() {
    assert!(ParseCache::compute_file_checksum(&PathBuf::from("/nonexistent/x.php")).is_err());
}
