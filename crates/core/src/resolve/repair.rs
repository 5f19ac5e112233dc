//! Basic-info repair: file paths, final ids and call-site location hints
//!
//! Extraction runs per file and knows nothing about where the file lives in
//! the project, so ids and file fields are left blank until every file is
//! parsed. This pass fills them in once, globally, before the index is
//! built.

use crate::ids::{class_id, method_id};
use crate::model::{CallSite, ImportRecord, NamespaceRecord, ParsedFile};
use std::collections::BTreeMap;

/// Stamp file paths and ids on every declaration and location hints on every
/// call site.
pub fn repair_basic_info(files: &mut BTreeMap<String, ParsedFile>) {
    for (path, file) in files.iter_mut() {
        let path = path.replace('\\', "/");
        let ParsedFile {
            methods,
            classes,
            imports,
            namespaces,
            ..
        } = file;

        for class in classes.iter_mut() {
            class.file = path.clone();
            class.id = class_id(
                &path,
                class.namespace.as_deref(),
                &class.name,
                class.start_line,
                class.end_line,
            );
        }

        let declarations = methods
            .iter_mut()
            .chain(classes.iter_mut().flat_map(|c| c.methods.iter_mut()));
        for method in declarations {
            method.file = path.clone();
            method.id = method_id(
                &path,
                method.class_name.as_deref(),
                &method.name,
                method.start_line,
                method.end_line,
            );
            for call in method.calls.iter_mut() {
                repair_call(call, &path, namespaces.as_slice(), imports.as_slice());
            }
        }
    }
}

/// Where the callee may live, as far as the caller's file can tell.
///
/// Native calls are pinned to the caller's file. Other calls collect the
/// includes and `use` namespaces that textually precede them; a single hint
/// is promoted to the call's `file` or `namespace`.
fn repair_call(
    call: &mut CallSite,
    path: &str,
    namespaces: &[NamespaceRecord],
    imports: &[ImportRecord],
) {
    let line = call.start_line;

    if call.is_native {
        call.file = Some(path.to_string());
        call.may_namespaces = namespaces
            .iter()
            .filter(|ns| ns.start_line <= line && !ns.name.is_empty())
            .map(|ns| ns.name.clone())
            .collect();
    } else {
        call.may_files = imports
            .iter()
            .filter(|i| i.kind.is_file_import() && i.end_line <= line)
            .filter_map(|i| i.path.clone())
            .collect();
        if let [only] = call.may_files.as_slice() {
            call.file = Some(only.clone());
        }

        call.may_namespaces = imports
            .iter()
            .filter(|i| !i.kind.is_file_import() && i.end_line <= line)
            .filter_map(|i| i.namespace.clone())
            .collect();
    }

    if let [only] = call.may_namespaces.as_slice() {
        call.namespace = Some(only.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImportKind, MethodType};

    fn import(kind: ImportKind, line: usize, namespace: Option<&str>, path: Option<&str>) -> ImportRecord {
        ImportRecord {
            kind,
            start_line: line,
            end_line: line,
            namespace: namespace.map(String::from),
            path: path.map(String::from),
            use_from: None,
            alias: None,
            text: String::new(),
        }
    }

    #[test]
    fn test_non_native_call_collects_preceding_imports() {
        let imports = vec![
            import(ImportKind::RequireOnce, 2, None, Some("'lib/a.php'")),
            import(ImportKind::UseClass, 3, Some("App\\Models"), None),
            import(ImportKind::Include, 20, None, Some("'late.php'")),
        ];
        let mut call = CallSite::new("foo", "foo", MethodType::General);
        call.start_line = 10;

        repair_call(&mut call, "index.php", &[], &imports);

        assert_eq!(call.may_files, vec!["'lib/a.php'".to_string()]);
        assert_eq!(call.file.as_deref(), Some("'lib/a.php'"));
        assert_eq!(call.may_namespaces, vec!["App\\Models".to_string()]);
        assert_eq!(call.namespace.as_deref(), Some("App\\Models"));
    }

    #[test]
    fn test_native_call_is_pinned_to_its_file() {
        let namespaces = vec![NamespaceRecord {
            name: "App".to_string(),
            start_line: 2,
            end_line: 40,
        }];
        let mut call = CallSite::new("helper", "helper", MethodType::General);
        call.start_line = 10;
        call.is_native = true;

        repair_call(&mut call, "src/a.php", &namespaces, &[]);

        assert_eq!(call.file.as_deref(), Some("src/a.php"));
        assert_eq!(call.namespace.as_deref(), Some("App"));
        assert!(call.may_files.is_empty());
    }
}
