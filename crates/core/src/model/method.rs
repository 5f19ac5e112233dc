//! Function and method declarations

use super::{CallSite, MethodType, Modifier, Visibility};
use serde::{Deserialize, Serialize};

/// A declared function or method
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodRecord {
    /// Content-derived id, empty until the repair pass stamps it
    #[serde(default)]
    pub id: String,

    pub name: String,

    /// `Class::name` for static methods and constructors, `Class->name` for
    /// instance methods, the bare name for free functions
    pub fullname: String,

    /// Owning class, `None` for free functions
    pub class_name: Option<String>,

    /// Owning file, relative to the project root with `/` separators
    #[serde(default)]
    pub file: String,

    pub namespace: Option<String>,

    pub start_line: usize,

    pub end_line: usize,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub modifiers: Vec<Modifier>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    pub return_type: Option<String>,

    /// Text of every `return` expression in the body
    #[serde(default)]
    pub return_values: Vec<String>,

    pub method_type: MethodType,

    /// Call sites found in the body
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallSite>,

    /// Ids of declarations with a call site resolving here
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub called_by: Vec<String>,
}

impl MethodRecord {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }

    /// Copy without call sites or reverse links, as stored in the index.
    pub fn summary(&self) -> Self {
        Self {
            calls: Vec::new(),
            called_by: Vec::new(),
            ..self.clone()
        }
    }
}

/// A declared parameter, or an argument at a call site
///
/// Declarations fill `name`, `param_type` and `default`. Call-site arguments
/// carry `value` text plus a literal-shape type when the argument is a
/// constant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Parameter {
    pub index: usize,

    pub name: Option<String>,

    #[serde(rename = "type")]
    pub param_type: Option<String>,

    pub default: Option<String>,

    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub variadic: bool,
}
