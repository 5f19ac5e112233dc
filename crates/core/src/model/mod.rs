//! Declarative records produced by extraction and consumed by resolution
//!
//! Every record here is plain data: extraction creates them once per file,
//! the repair pass stamps file paths and ids, and the resolver only appends
//! candidate maps to call sites. Nothing holds a reference to another record;
//! cross-record links (base classes, call targets) are names or ids that get
//! looked up through [`crate::resolve::CrossFileIndex`].

mod call;
mod class;
mod file;
mod method;

pub use call::CallSite;
pub use class::{ClassKind, ClassRecord, ClassRef, PropertyRecord};
pub use file::{
    FileFailure, ImportKind, ImportRecord, NamespaceRecord, ObjectBinding, ParsedFile,
    VariableKind, VariableRecord,
};
pub use method::{MethodRecord, Parameter};

pub(crate) use file::namespace_at;

use serde::{Deserialize, Serialize};

/// Name of the synthetic declaration that owns calls made outside any
/// function or class body.
pub const NOT_IN_METHOD: &str = "NOT_IN_METHOD";

/// Classification of a declaration or call site.
///
/// The resolver matches on this exhaustively, so a new call shape has to
/// pick a branch before it compiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodType {
    /// Free function
    General,
    /// Language or standard-library function, never resolved
    Builtin,
    /// Target not statically known (`$fn()`), never resolved
    Dynamic,
    /// Object instantiation
    Construct,
    /// Language-reserved hook declared in the project (`__get`, `__call`, ...)
    Magic,
    /// Ordinary instance or static method
    ClassMethod,
}

impl MethodType {
    /// Whether call sites of this type go through index lookup at all.
    pub fn is_resolvable(self) -> bool {
        !matches!(self, MethodType::Builtin | MethodType::Dynamic)
    }

    /// Whether resolution goes through the class maps.
    pub fn is_class_bound(self) -> bool {
        matches!(
            self,
            MethodType::Construct | MethodType::Magic | MethodType::ClassMethod
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Static,
    Abstract,
    Final,
    Readonly,
    /// Class constant (`const X = 1;`)
    Const,
}

impl Modifier {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "static" => Some(Modifier::Static),
            "abstract" => Some(Modifier::Abstract),
            "final" => Some(Modifier::Final),
            "readonly" => Some(Modifier::Readonly),
            "const" => Some(Modifier::Const),
            _ => None,
        }
    }
}
