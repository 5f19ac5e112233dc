//! End-to-end tests: discovery, parsing, caching, resolution and output over
//! a project on disk

use callmap_core::ids::method_id;
use callmap_core::output::CATEGORIES;
use callmap_core::{
    write_outputs, AnalyzeOptions, Analyzer, CacheError, OutputOptions, ParsedFile,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DOG: &str = r#"<?php
namespace App\Animals;

class Dog {
    public function bark($times) {
        return str_repeat('woof', $times);
    }
}
"#;

const MAIN: &str = r#"<?php
use App\Animals\Dog;

require_once 'src/Dog.php';

function main() {
    $d = new Dog();
    $d->bark(2);
}

main();
"#;

fn write_project(dir: &Path) {
    fs::create_dir_all(dir.join("src")).unwrap();
    fs::create_dir_all(dir.join("vendor/lib")).unwrap();
    fs::create_dir_all(dir.join("temp/compiled")).unwrap();
    fs::write(dir.join("src/Dog.php"), DOG).unwrap();
    fs::write(dir.join("main.php"), MAIN).unwrap();
    fs::write(dir.join("vendor/lib/Dog.php"), DOG).unwrap();
    fs::write(dir.join("temp/compiled/cached.php"), "<?php\nmain();\n").unwrap();
    fs::write(dir.join("README.md"), "# not php\n").unwrap();
}

fn options() -> AnalyzeOptions {
    AnalyzeOptions {
        project_name: "demo".to_string(),
        use_cache: false,
        ..AnalyzeOptions::default()
    }
}

fn paths(files: &BTreeMap<String, ParsedFile>) -> Vec<&str> {
    files.keys().map(String::as_str).collect()
}

#[test]
fn test_analyze_project() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());

    let analyzer = Analyzer::new(temp_dir.path(), options()).unwrap();
    let result = analyzer.run().unwrap();

    // vendor and temp/compiled are excluded by default
    assert_eq!(paths(&result.files), vec!["main.php", "src/Dog.php"]);
    assert_eq!(result.discovered, 2);
    assert!(result.failures.is_empty());
    assert!(!result.from_cache);

    let bark_id = method_id("src/Dog.php", Some("Dog"), "bark", 5, 7);
    let dog = &result.files["src/Dog.php"].classes[0];
    assert_eq!(dog.file, "src/Dog.php");
    assert_eq!(dog.namespace.as_deref(), Some("App\\Animals"));
    assert_eq!(dog.methods[0].id, bark_id);

    let main = result.files["main.php"]
        .methods
        .iter()
        .find(|m| m.name == "main")
        .unwrap();
    let bark = main.calls.iter().find(|c| c.name == "bark").unwrap();
    assert_eq!(bark.may_files, vec!["'src/Dog.php'".to_string()]);
    assert_eq!(bark.namespace.as_deref(), Some("App\\Animals"));
    assert!(bark
        .may_be_source
        .as_ref()
        .is_some_and(|c| c.get(&bark_id).map(String::as_str) == Some("src/Dog.php")));

    // main() -> Dog::__construct (implicit), Dog->bark; bark -> str_repeat is builtin
    assert_eq!(result.stats.builtin, 1);
    assert!(result.graph.callees_of(&main.id).contains(&bark_id.as_str()));
    assert_eq!(result.graph.callers_of(&bark_id), vec![main.id.as_str()]);
    assert_eq!(dog.methods[0].called_by, vec![main.id.clone()]);
    let edges = result.graph.edges_between(&main.id, &bark_id);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].line, 8);
}

#[test]
fn test_extra_exclusions() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());

    let mut opts = options();
    opts.exclude_dirs.push("src".to_string());
    let analyzer = Analyzer::new(temp_dir.path(), opts).unwrap();
    let result = analyzer.run().unwrap();
    assert_eq!(paths(&result.files), vec!["main.php"]);

    let mut opts = options();
    opts.exclude_dirs.clear();
    opts.ignore_paths.push("temp/".to_string());
    let analyzer = Analyzer::new(temp_dir.path(), opts).unwrap();
    let result = analyzer.run().unwrap();
    assert_eq!(
        paths(&result.files),
        vec!["main.php", "src/Dog.php", "vendor/lib/Dog.php"]
    );
}

#[test]
fn test_missing_project_path_fails() {
    let temp_dir = TempDir::new().unwrap();
    assert!(Analyzer::new(&temp_dir.path().join("nope"), options()).is_err());

    let file = temp_dir.path().join("file.php");
    fs::write(&file, "<?php\n").unwrap();
    assert!(Analyzer::new(&file, options()).is_err());
}

#[test]
fn test_empty_project() {
    let temp_dir = TempDir::new().unwrap();
    let analyzer = Analyzer::new(temp_dir.path(), options()).unwrap();
    let result = analyzer.run().unwrap();
    assert!(result.files.is_empty());
    assert_eq!(result.stats.total(), 0);
    assert_eq!(result.graph.node_count(), 0);
}

#[test]
fn test_serial_and_parallel_parsing_agree() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());
    for i in 0..20 {
        fs::write(
            temp_dir.path().join(format!("gen{}.php", i)),
            format!(
                "<?php\nfunction gen{i}($x) {{\n    return gen{next}($x);\n}}\n",
                i = i,
                next = (i + 1) % 20
            ),
        )
        .unwrap();
    }

    let serial = Analyzer::new(temp_dir.path(), options()).unwrap().run().unwrap();
    let mut opts = options();
    opts.workers = 4;
    let parallel = Analyzer::new(temp_dir.path(), opts).unwrap().run().unwrap();

    assert_eq!(serial.files, parallel.files);
    assert_eq!(serial.stats, parallel.stats);
    assert_eq!(serial.graph.edge_count(), parallel.graph.edge_count());
}

#[test]
fn test_cache_is_reused_and_invalidated() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());
    let mut opts = options();
    opts.use_cache = true;

    let analyzer = Analyzer::new(temp_dir.path(), opts).unwrap();
    let first = analyzer.run().unwrap();
    assert!(!first.from_cache);
    assert!(analyzer.cache().data_path().exists());
    assert!(analyzer
        .cache()
        .data_path()
        .starts_with(analyzer.root().join(".callmap-cache")));

    let second = analyzer.run().unwrap();
    assert!(second.from_cache);
    assert_eq!(first.files, second.files);
    assert_eq!(first.stats, second.stats);

    fs::write(temp_dir.path().join("extra.php"), "<?php\nfunction extra() {}\n").unwrap();
    let third = analyzer.run().unwrap();
    assert!(!third.from_cache);
    assert!(third.files.contains_key("extra.php"));
}

#[test]
fn test_corrupt_cache_surfaces_cache_error() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());
    let mut opts = options();
    opts.use_cache = true;

    let analyzer = Analyzer::new(temp_dir.path(), opts).unwrap();
    analyzer.run().unwrap();
    fs::write(analyzer.cache().data_path(), "[[[").unwrap();

    let files = analyzer.discover().unwrap();
    let err = analyzer.parse(&files).unwrap_err();
    assert!(err.downcast_ref::<CacheError>().is_some());

    // clearing recovers
    analyzer.cache().clear().unwrap();
    let parsed = analyzer.parse(&files).unwrap();
    assert!(!parsed.from_cache);
    assert_eq!(parsed.files.len(), 2);
}

#[test]
fn test_unreadable_file_is_reported_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());
    // invalid UTF-8 is decoded lossily, not rejected
    fs::write(temp_dir.path().join("latin1.php"), b"<?php\n// caf\xe9\nfoo();\n").unwrap();

    let analyzer = Analyzer::new(temp_dir.path(), options()).unwrap();
    let mut files = analyzer.discover().unwrap();
    files.push(analyzer.root().join("gone.php"));

    let parsed = analyzer.parse(&files).unwrap();
    assert!(parsed.files.contains_key("latin1.php"));
    assert_eq!(parsed.failures.len(), 1);
    assert_eq!(parsed.failures[0].path, "gone.php");
}

#[test]
fn test_split_output() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());
    let result = Analyzer::new(temp_dir.path(), options())
        .unwrap()
        .run()
        .unwrap();

    let out_dir = TempDir::new().unwrap();
    let prefix = out_dir.path().join("demo.parsed");
    let written = write_outputs(
        &result,
        &prefix.to_string_lossy(),
        OutputOptions::default(),
    )
    .unwrap();
    assert_eq!(written.len(), CATEGORIES.len());
    assert_eq!(
        CATEGORIES.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
        vec!["method", "class", "import", "namespace", "variable", "called"]
    );
    for category in CATEGORIES {
        assert!(out_dir
            .path()
            .join(format!("demo.parsed.{}.json", category))
            .exists());
    }

    let methods: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out_dir.path().join("demo.parsed.method.json")).unwrap(),
    )
    .unwrap();
    let main_methods = methods["main.php"].as_array().unwrap();
    assert!(main_methods.iter().all(|m| m.get("calls").is_none()));
    assert!(main_methods.iter().any(|m| m["name"] == "main"));

    let called: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out_dir.path().join("demo.parsed.called.json")).unwrap(),
    )
    .unwrap();
    let entries = called["main.php"].as_array().unwrap();
    assert!(entries
        .iter()
        .any(|e| e["fullname"] == "main" && !e["calls"].as_array().unwrap().is_empty()));

    // Dog.php declares no variables, so it is left out of that category
    let variables: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out_dir.path().join("demo.parsed.variable.json")).unwrap(),
    )
    .unwrap();
    assert!(variables.get("src/Dog.php").is_none());
}

#[test]
fn test_single_output() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());
    let result = Analyzer::new(temp_dir.path(), options())
        .unwrap()
        .run()
        .unwrap();

    let out_dir = TempDir::new().unwrap();
    let prefix = out_dir.path().join("nested/out");
    let written = write_outputs(
        &result,
        &prefix.to_string_lossy(),
        OutputOptions {
            split: false,
            pretty: false,
        },
    )
    .unwrap();
    assert_eq!(written, vec![out_dir.path().join("nested/out.json")]);

    let contents = fs::read_to_string(&written[0]).unwrap();
    let decoded: BTreeMap<String, ParsedFile> = serde_json::from_str(&contents).unwrap();
    assert_eq!(decoded, result.files);
}
