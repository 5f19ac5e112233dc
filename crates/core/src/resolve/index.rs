//! Project-wide lookup maps over repaired per-file records

use crate::builtins::is_magic_method;
use crate::model::{ClassRecord, MethodRecord, ParsedFile, NOT_IN_METHOD};
use std::collections::{BTreeMap, HashMap};

/// Name- and id-keyed maps over every declaration in the project.
///
/// Records are stored as summaries (call lists dropped); the index never
/// points back into the per-file map, so the resolver can mutate call sites
/// while reading it.
#[derive(Debug, Default)]
pub struct CrossFileIndex {
    functions: HashMap<String, MethodRecord>,
    function_ids_by_name: HashMap<String, Vec<String>>,

    classes: HashMap<String, ClassRecord>,
    class_ids_by_name: HashMap<String, Vec<String>>,
    class_ids_by_method_fullname: HashMap<String, Vec<String>>,
    /// Magic method names are left out: they match too many classes
    class_ids_by_method_name: HashMap<String, Vec<String>>,
}

impl CrossFileIndex {
    /// Aggregate every file's declarations. Must run after the repair pass,
    /// since ids are only unique once they include the file path.
    pub fn build(files: &BTreeMap<String, ParsedFile>) -> Self {
        let mut index = Self::default();

        for file in files.values() {
            for function in file.methods.iter().filter(|m| m.name != NOT_IN_METHOD) {
                push_unique(
                    index.function_ids_by_name.entry(function.name.clone()).or_default(),
                    &function.id,
                );
                index
                    .functions
                    .insert(function.id.clone(), function.summary());
            }

            for class in &file.classes {
                push_unique(
                    index.class_ids_by_name.entry(class.name.clone()).or_default(),
                    &class.id,
                );
                for method in &class.methods {
                    push_unique(
                        index
                            .class_ids_by_method_fullname
                            .entry(method.fullname.clone())
                            .or_default(),
                        &class.id,
                    );
                    if !is_magic_method(&method.name) {
                        push_unique(
                            index
                                .class_ids_by_method_name
                                .entry(method.name.clone())
                                .or_default(),
                            &class.id,
                        );
                    }
                }
                index.classes.insert(class.id.clone(), class.summary());
            }
        }

        index
    }

    pub fn function(&self, id: &str) -> Option<&MethodRecord> {
        self.functions.get(id)
    }

    pub fn class(&self, id: &str) -> Option<&ClassRecord> {
        self.classes.get(id)
    }

    pub fn function_ids_named(&self, name: &str) -> &[String] {
        lookup(&self.function_ids_by_name, name)
    }

    pub fn class_ids_named(&self, name: &str) -> &[String] {
        lookup(&self.class_ids_by_name, name)
    }

    pub fn class_ids_with_method_fullname(&self, fullname: &str) -> &[String] {
        lookup(&self.class_ids_by_method_fullname, fullname)
    }

    pub fn class_ids_with_method_name(&self, name: &str) -> &[String] {
        lookup(&self.class_ids_by_method_name, name)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

fn lookup<'a>(map: &'a HashMap<String, Vec<String>>, key: &str) -> &'a [String] {
    map.get(key).map(Vec::as_slice).unwrap_or(&[])
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}
