//! Per-file extraction result and the smaller records it carries

use super::{ClassRecord, MethodRecord};
use serde::{Deserialize, Serialize};

/// Everything extracted from one source file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedFile {
    /// Free functions, plus the file-level pseudo declaration when the file
    /// has top-level calls
    #[serde(default)]
    pub methods: Vec<MethodRecord>,

    #[serde(default)]
    pub classes: Vec<ClassRecord>,

    #[serde(default)]
    pub imports: Vec<ImportRecord>,

    #[serde(default)]
    pub namespaces: Vec<NamespaceRecord>,

    #[serde(default)]
    pub objects: Vec<ObjectBinding>,

    #[serde(default)]
    pub variables: Vec<VariableRecord>,
}

impl ParsedFile {
    /// Free functions followed by every class method.
    pub fn declarations(&self) -> impl Iterator<Item = &MethodRecord> {
        self.methods
            .iter()
            .chain(self.classes.iter().flat_map(|c| c.methods.iter()))
    }

    pub fn declarations_mut(&mut self) -> impl Iterator<Item = &mut MethodRecord> {
        self.methods
            .iter_mut()
            .chain(self.classes.iter_mut().flat_map(|c| c.methods.iter_mut()))
    }

    /// Namespace whose line range contains `line`; the latest start wins.
    pub fn namespace_at(&self, line: usize) -> Option<&NamespaceRecord> {
        namespace_at(&self.namespaces, line)
    }
}

pub(crate) fn namespace_at(namespaces: &[NamespaceRecord], line: usize) -> Option<&NamespaceRecord> {
    namespaces
        .iter()
        .filter(|ns| ns.start_line <= line && line <= ns.end_line)
        .max_by_key(|ns| ns.start_line)
}

/// A namespace declaration and the lines it governs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespaceRecord {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    UseClass,
    UseFunction,
    UseConst,
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

impl ImportKind {
    /// include/require family, as opposed to `use`
    pub fn is_file_import(self) -> bool {
        matches!(
            self,
            ImportKind::Include
                | ImportKind::IncludeOnce
                | ImportKind::Require
                | ImportKind::RequireOnce
        )
    }
}

/// A `use` declaration or an include/require expression
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportRecord {
    pub kind: ImportKind,

    pub start_line: usize,

    pub end_line: usize,

    /// Namespace part of a `use` path
    pub namespace: Option<String>,

    /// Raw path expression of an include/require
    pub path: Option<String>,

    /// Full `use` path
    pub use_from: Option<String>,

    pub alias: Option<String>,

    /// Statement text, verbatim
    pub text: String,
}

/// Binds a variable to the class it was constructed or typed as, valid
/// from `start_line` to `end_line`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectBinding {
    pub object: String,
    pub class_name: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// `$_GET['x']` and friends
    SuperGlobal,
    /// `global $x;`
    Global,
    /// `static $x = 0;` inside a function
    Static,
    /// `define('X', ...)` and `const X = ...;` outside classes
    Constant,
    /// Assignment inside a function or method
    Local,
    /// Assignment in file-level code
    Program,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariableRecord {
    pub kind: VariableKind,
    pub name: String,
    pub value: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    /// Enclosing function or method name; [`super::NOT_IN_METHOD`] at file level
    pub scope: Option<String>,
}

/// A file that could not be read or parsed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}
