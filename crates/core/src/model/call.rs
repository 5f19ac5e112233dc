//! Call-site records

use super::{MethodType, Modifier, Parameter, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point in a declaration's body that invokes a function, method or
/// constructor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallSite {
    /// Name as written (`foo`, `bark`, `__construct` for `new`)
    pub name: String,

    /// `foo`, `$obj->bark`, `Cls::make`, `Dog::__construct`
    pub fullname: String,

    pub start_line: usize,

    pub end_line: usize,

    /// Object or scope expression for method and static calls
    pub object: Option<String>,

    /// Class of the callee when it could be guessed
    pub class_name: Option<String>,

    /// Always public: the caller side cannot verify anything stronger
    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub modifiers: Vec<Modifier>,

    pub method_type: MethodType,

    #[serde(default)]
    pub arguments: Vec<Parameter>,

    /// Target name is declared in the caller's own file
    #[serde(default)]
    pub is_native: bool,

    /// File hint: the caller's file for native calls, the single include
    /// otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// include/require paths preceding the call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub may_files: Vec<String>,

    /// Namespaces in scope for the call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub may_namespaces: Vec<String>,

    /// Candidate declaration id -> declaring file. `None` means unresolved,
    /// an empty map means the candidate set was too ambiguous to keep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub may_be_source: Option<BTreeMap<String, String>>,
}

impl CallSite {
    pub fn new(name: impl Into<String>, fullname: impl Into<String>, method_type: MethodType) -> Self {
        Self {
            name: name.into(),
            fullname: fullname.into(),
            start_line: 0,
            end_line: 0,
            object: None,
            class_name: None,
            visibility: Visibility::Public,
            modifiers: Vec::new(),
            method_type,
            arguments: Vec::new(),
            is_native: false,
            file: None,
            namespace: None,
            may_files: Vec::new(),
            may_namespaces: Vec::new(),
            may_be_source: None,
        }
    }

    pub fn has_import_hints(&self) -> bool {
        !self.may_files.is_empty() || !self.may_namespaces.is_empty()
    }
}
