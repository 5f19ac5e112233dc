//! Integration tests for cross-file call resolution
//!
//! Each test parses a small in-memory project, runs repair, indexing and
//! resolution, then checks the candidate maps written onto the call sites.

use callmap_core::ids::{class_id, method_id};
use callmap_core::{
    resolve_project, CallSite, MethodType, ParsedFile, PhpParser, ResolutionStats, ResolveOptions,
    NOT_IN_METHOD,
};
use std::collections::BTreeMap;

fn resolve_sources(
    sources: &[(&str, &str)],
    options: ResolveOptions,
) -> (BTreeMap<String, ParsedFile>, ResolutionStats) {
    let parser = PhpParser::new().expect("PHP parser");
    let files = sources
        .iter()
        .map(|(path, source)| {
            let parsed = parser.parse_source(source).expect("Failed to parse PHP source");
            (path.to_string(), parsed)
        })
        .collect();
    let (files, stats, _graph) = resolve_project(files, options);
    (files, stats)
}

fn resolve(sources: &[(&str, &str)]) -> (BTreeMap<String, ParsedFile>, ResolutionStats) {
    resolve_sources(sources, ResolveOptions::default())
}

/// First call site named `name` in any declaration of `path`.
fn call<'a>(files: &'a BTreeMap<String, ParsedFile>, path: &str, name: &str) -> &'a CallSite {
    files[path]
        .declarations()
        .flat_map(|d| d.calls.iter())
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no call to {} in {}", name, path))
}

#[test]
fn test_local_function_resolves_when_arity_fits() {
    let source = r#"<?php
function foo($a, $b = 1) {
    return $a + $b;
}

foo(1);
"#;
    let (files, stats) = resolve(&[("a.php", source)]);

    let site = call(&files, "a.php", "foo");
    assert_eq!(site.method_type, MethodType::General);
    assert!(site.is_native);
    assert_eq!(site.file.as_deref(), Some("a.php"));

    let expected_id = method_id("a.php", None, "foo", 2, 4);
    let candidates = site.may_be_source.as_ref().expect("resolved");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates.get(&expected_id).map(String::as_str), Some("a.php"));
    assert_eq!(stats.resolved, 1);
}

#[test]
fn test_too_many_arguments_leaves_call_unresolved() {
    let source = r#"<?php
function pair($a, $b) {}

pair(1, 2, 3);
"#;
    let (files, stats) = resolve(&[("a.php", source)]);

    assert_eq!(call(&files, "a.php", "pair").may_be_source, None);
    assert_eq!(stats.unresolved, 1);
}

#[test]
fn test_construction_and_bound_method_across_files() {
    let dog = r#"<?php
class Dog {
    public function bark() {
        return "woof";
    }
}
"#;
    let main = r#"<?php
$d = new Dog();
$d->bark();
"#;
    let (files, _) = resolve(&[("dog.php", dog), ("main.php", main)]);

    // Dog declares no constructor: `new Dog()` points at the class itself
    let construct = call(&files, "main.php", "__construct");
    assert_eq!(construct.method_type, MethodType::Construct);
    assert_eq!(construct.class_name.as_deref(), Some("Dog"));
    let dog_id = class_id("dog.php", None, "Dog", 2, 6);
    let candidates = construct.may_be_source.as_ref().expect("resolved");
    assert_eq!(candidates.keys().collect::<Vec<_>>(), vec![&dog_id]);

    let bark = call(&files, "main.php", "bark");
    assert_eq!(bark.method_type, MethodType::ClassMethod);
    assert_eq!(bark.class_name.as_deref(), Some("Dog"));
    assert!(!bark.is_native);
    let bark_id = method_id("dog.php", Some("Dog"), "bark", 3, 5);
    let candidates = bark.may_be_source.as_ref().expect("resolved");
    assert_eq!(candidates.get(&bark_id).map(String::as_str), Some("dog.php"));
    assert_eq!(candidates.len(), 1);
}

#[test]
fn test_declared_constructor_is_the_candidate() {
    let source = r#"<?php
class Point {
    public function __construct($x, $y) {}
}

$p = new Point(1, 2);
"#;
    let (files, _) = resolve(&[("point.php", source)]);

    let construct = call(&files, "point.php", "__construct");
    assert!(construct.is_native);
    let ctor_id = method_id("point.php", Some("Point"), "__construct", 3, 3);
    let candidates = construct.may_be_source.as_ref().expect("resolved");
    assert_eq!(candidates.keys().collect::<Vec<_>>(), vec![&ctor_id]);
}

#[test]
fn test_constructor_name_case_does_not_matter() {
    let foo = r#"<?php
class Foo {
    public function __Construct($x) {}
}
"#;
    let main = r#"<?php
$f = new Foo(1);
"#;
    let (files, stats) = resolve(&[("foo.php", foo), ("main.php", main)]);

    let declared = &files["foo.php"].classes[0].methods[0];
    assert_eq!(declared.fullname, "Foo::__construct");
    assert_eq!(declared.method_type, MethodType::Construct);

    let construct = call(&files, "main.php", "__construct");
    let ctor_id = method_id("foo.php", Some("Foo"), "__Construct", 3, 3);
    let candidates = construct.may_be_source.as_ref().expect("resolved");
    assert_eq!(candidates.keys().collect::<Vec<_>>(), vec![&ctor_id]);
    assert_eq!(stats.resolved, 1);
}

#[test]
fn test_private_method_in_other_file_is_excluded() {
    let vault = r#"<?php
class Vault {
    private function secret() {}
}
"#;
    let main = r#"<?php
$obj = new Vault();
$obj->secret();
"#;
    let (files, _) = resolve(&[("vault.php", vault), ("main.php", main)]);

    assert_eq!(call(&files, "main.php", "secret").may_be_source, None);
}

#[test]
fn test_private_method_called_through_this_resolves() {
    let source = r#"<?php
class Vault {
    private function secret() {}

    public function open() {
        $this->secret();
    }
}
"#;
    let (files, _) = resolve(&[("vault.php", source)]);

    let site = call(&files, "vault.php", "secret");
    assert!(site.is_native);
    let secret_id = method_id("vault.php", Some("Vault"), "secret", 3, 3);
    assert!(site
        .may_be_source
        .as_ref()
        .is_some_and(|c| c.contains_key(&secret_id)));
}

#[test]
fn test_protected_method_in_other_file_resolves() {
    let util = r#"<?php
class Util {
    protected function prot() {}
}
"#;
    let main = r#"<?php
$u = new Util();
$u->prot();
"#;
    let (files, _) = resolve(&[("util.php", util), ("main.php", main)]);

    let site = call(&files, "main.php", "prot");
    assert!(!site.is_native);
    let prot_id = method_id("util.php", Some("Util"), "prot", 3, 3);
    let candidates = site.may_be_source.as_ref().expect("resolved");
    assert_eq!(candidates.get(&prot_id).map(String::as_str), Some("util.php"));
}

#[test]
fn test_builtin_call_is_never_looked_up() {
    let source = r#"<?php
function run($s) {
    return strlen($s);
}
"#;
    let (files, stats) = resolve(&[("a.php", source)]);

    let site = call(&files, "a.php", "strlen");
    assert_eq!(site.method_type, MethodType::Builtin);
    assert_eq!(site.may_be_source, None);
    assert_eq!(stats.builtin, 1);
    assert_eq!(stats.unresolved, 0);
}

#[test]
fn test_locally_declared_builtin_name_is_general() {
    let source = r#"<?php
function strlen($s) {
    return 0;
}

strlen("x");
"#;
    let (files, stats) = resolve(&[("shim.php", source)]);

    let site = call(&files, "shim.php", "strlen");
    assert_eq!(site.method_type, MethodType::General);
    assert!(site.may_be_source.as_ref().is_some_and(|c| c.len() == 1));
    assert_eq!(stats.builtin, 0);
}

#[test]
fn test_variable_function_is_dynamic() {
    let source = r#"<?php
function handler() {}

$fnName = 'handler';
$fnName(1);
"#;
    let (files, stats) = resolve(&[("a.php", source)]);

    let site = call(&files, "a.php", "$fnName");
    assert_eq!(site.method_type, MethodType::Dynamic);
    assert_eq!(site.may_be_source, None);
    assert_eq!(stats.dynamic, 1);
}

#[test]
fn test_native_call_ignores_same_name_in_other_files() {
    let a = r#"<?php
function helper() {}

helper();
"#;
    let b = r#"<?php
function helper() {}
"#;
    let (files, _) = resolve(&[("a.php", a), ("b.php", b)]);

    let candidates = call(&files, "a.php", "helper")
        .may_be_source
        .clone()
        .expect("resolved");
    assert_eq!(candidates.len(), 1);
    assert!(candidates.values().all(|file| file == "a.php"));
}

#[test]
fn test_non_native_call_sees_every_declaration() {
    let a = r#"<?php
function helper() {}
"#;
    let b = r#"<?php
function helper() {}
"#;
    let main = r#"<?php
helper();
"#;
    let (files, _) = resolve(&[("a.php", a), ("b.php", b), ("main.php", main)]);

    let candidates = call(&files, "main.php", "helper")
        .may_be_source
        .clone()
        .expect("resolved");
    let mut declaring: Vec<&str> = candidates.values().map(String::as_str).collect();
    declaring.sort_unstable();
    assert_eq!(declaring, vec!["a.php", "b.php"]);
}

#[test]
fn test_import_filter_narrows_by_include() {
    let a = r#"<?php
function helper() {}
"#;
    let b = r#"<?php
function helper() {}
"#;
    let main = r#"<?php
require_once 'lib/b.php';
helper();
"#;
    let sources = [("lib/a.php", a), ("lib/b.php", b), ("main.php", main)];

    let (unfiltered, _) = resolve_sources(&sources, ResolveOptions::default());
    let site = call(&unfiltered, "main.php", "helper");
    assert_eq!(site.may_files, vec!["'lib/b.php'".to_string()]);
    assert_eq!(site.may_be_source.as_ref().map(|c| c.len()), Some(2));

    let options = ResolveOptions {
        import_filter: true,
        ..ResolveOptions::default()
    };
    let (filtered, _) = resolve_sources(&sources, options);
    let candidates = call(&filtered, "main.php", "helper")
        .may_be_source
        .clone()
        .expect("resolved");
    let declaring: Vec<&str> = candidates.values().map(String::as_str).collect();
    assert_eq!(declaring, vec!["lib/b.php"]);
}

#[test]
fn test_import_filter_narrows_by_use_namespace() {
    let mailer = r#"<?php
namespace App\Mail;

class Sender {
    public function send($to) {}
}
"#;
    let sms = r#"<?php
namespace App\Sms;

class Sender {
    public function send($to) {}
}
"#;
    let main = r#"<?php
use App\Mail\Sender;

$s = new Sender();
$s->send('a@b.c');
"#;
    let options = ResolveOptions {
        import_filter: true,
        ..ResolveOptions::default()
    };
    let (files, _) = resolve_sources(
        &[("mail.php", mailer), ("sms.php", sms), ("main.php", main)],
        options,
    );

    let site = call(&files, "main.php", "send");
    assert_eq!(site.may_namespaces, vec!["App\\Mail".to_string()]);
    assert_eq!(site.namespace.as_deref(), Some("App\\Mail"));
    let declaring: Vec<&str> = site
        .may_be_source
        .as_ref()
        .expect("resolved")
        .values()
        .map(String::as_str)
        .collect();
    assert_eq!(declaring, vec!["mail.php"]);
}

#[test]
fn test_ambiguous_method_name_is_dropped() {
    let mut sources: Vec<(String, String)> = (0..12)
        .map(|i| {
            (
                format!("models/m{}.php", i),
                format!("<?php\nclass Model{} {{\n    public function save() {{}}\n}}\n", i),
            )
        })
        .collect();
    sources.push((
        "main.php".to_string(),
        "<?php\nfunction store($record) {\n    $record->save();\n}\n".to_string(),
    ));
    let borrowed: Vec<(&str, &str)> = sources
        .iter()
        .map(|(p, s)| (p.as_str(), s.as_str()))
        .collect();

    let (files, stats) = resolve(&borrowed);

    let site = call(&files, "main.php", "save");
    assert_eq!(site.class_name, None);
    assert_eq!(site.may_be_source, Some(BTreeMap::new()));
    assert_eq!(stats.ambiguous, 1);
}

#[test]
fn test_cap_applies_before_arity_filtering() {
    // eleven zero-argument saves and one that takes the argument: arity alone
    // would leave a single candidate, but the raw set is over the cap
    let mut sources: Vec<(String, String)> = (0..11)
        .map(|i| {
            (
                format!("models/m{}.php", i),
                format!("<?php\nclass Model{} {{\n    public function save() {{}}\n}}\n", i),
            )
        })
        .collect();
    sources.push((
        "models/keyed.php".to_string(),
        "<?php\nclass Keyed {\n    public function save($key) {}\n}\n".to_string(),
    ));
    sources.push((
        "main.php".to_string(),
        "<?php\nfunction store($record) {\n    $record->save(1);\n}\n".to_string(),
    ));
    let borrowed: Vec<(&str, &str)> = sources
        .iter()
        .map(|(p, s)| (p.as_str(), s.as_str()))
        .collect();

    let (files, stats) = resolve(&borrowed);

    assert_eq!(call(&files, "main.php", "save").may_be_source, Some(BTreeMap::new()));
    assert_eq!(stats.ambiguous, 1);
    assert_eq!(stats.resolved, 0);
}

#[test]
fn test_file_level_binding_does_not_reach_into_functions() {
    let util = r#"<?php
class Util {
    public function run() {}
}
"#;
    let main = r#"<?php
$u = new Util();
$u->run();

function later() {
    $u->run();
}
"#;
    let (files, _) = resolve(&[("util.php", util), ("main.php", main)]);

    let top = files["main.php"]
        .declarations()
        .find(|d| d.name == NOT_IN_METHOD)
        .expect("file-level calls");
    assert_eq!(top.calls[0].class_name.as_deref(), Some("Util"));

    let inner = files["main.php"]
        .declarations()
        .find(|d| d.name == "later")
        .expect("later()");
    assert_eq!(inner.calls[0].class_name, None);
}

#[test]
fn test_method_name_fallback_under_the_cap() {
    let a = r#"<?php
class Cat {
    public function speak() {}
}
"#;
    let b = r#"<?php
class Cow {
    public function speak() {}
}
"#;
    let main = r#"<?php
function talk($animal) {
    $animal->speak();
}
"#;
    let (files, _) = resolve(&[("cat.php", a), ("cow.php", b), ("main.php", main)]);

    let candidates = call(&files, "main.php", "speak")
        .may_be_source
        .clone()
        .expect("resolved");
    assert_eq!(candidates.len(), 2);
}

#[test]
fn test_typed_parameter_binds_object() {
    let repo = r#"<?php
class Repo {
    public function find($id) {}
}
class Other {
    public function find($id) {}
}
"#;
    let service = r#"<?php
function load(Repo $repo) {
    return $repo->find(1);
}
"#;
    let (files, _) = resolve(&[("repo.php", repo), ("service.php", service)]);

    let site = call(&files, "service.php", "find");
    assert_eq!(site.class_name.as_deref(), Some("Repo"));
    let find_id = method_id("repo.php", Some("Repo"), "find", 3, 3);
    let candidates = site.may_be_source.as_ref().expect("resolved");
    assert_eq!(candidates.keys().collect::<Vec<_>>(), vec![&find_id]);
}

#[test]
fn test_static_and_parent_calls() {
    let source = r#"<?php
class Base {
    public function __construct() {}
    public static function create() {}
}

class Child extends Base {
    public function __construct() {
        parent::__construct();
        Base::create();
    }
}
"#;
    let (files, _) = resolve(&[("a.php", source)]);

    let parent = files["a.php"].classes[1]
        .methods
        .iter()
        .flat_map(|m| m.calls.iter())
        .find(|c| c.name == "__construct")
        .expect("parent constructor call");
    assert_eq!(parent.class_name.as_deref(), Some("Base"));
    let base_ctor = method_id("a.php", Some("Base"), "__construct", 3, 3);
    assert!(parent
        .may_be_source
        .as_ref()
        .is_some_and(|c| c.contains_key(&base_ctor)));

    let create = call(&files, "a.php", "create");
    assert_eq!(create.fullname, "Base::create");
    assert!(create.modifiers.contains(&callmap_core::model::Modifier::Static));
    let create_id = method_id("a.php", Some("Base"), "create", 4, 4);
    assert!(create
        .may_be_source
        .as_ref()
        .is_some_and(|c| c.contains_key(&create_id)));
}

#[test]
fn test_called_by_links_back_to_callers() {
    let source = r#"<?php
function leaf() {}

function middle() {
    leaf();
}

middle();
"#;
    let (files, _) = resolve(&[("a.php", source)]);

    let decls: Vec<_> = files["a.php"].declarations().collect();
    let leaf = decls.iter().find(|d| d.name == "leaf").expect("leaf");
    let middle = decls.iter().find(|d| d.name == "middle").expect("middle");
    let file_level = decls
        .iter()
        .find(|d| d.name == NOT_IN_METHOD)
        .expect("file-level record");

    assert_eq!(leaf.called_by, vec![middle.id.clone()]);
    assert_eq!(middle.called_by, vec![file_level.id.clone()]);
    assert!(file_level.called_by.is_empty());
}

#[test]
fn test_resolution_is_repeatable() {
    let a = r#"<?php
class Dog {
    public function bark() {}
}
"#;
    let main = r#"<?php
$d = new Dog();
$d->bark();
strlen('x');
"#;
    let (first, first_stats) = resolve(&[("dog.php", a), ("main.php", main)]);
    let (second, second_stats) = resolve(&[("main.php", main), ("dog.php", a)]);

    assert_eq!(first, second);
    assert_eq!(first_stats, second_stats);
}
