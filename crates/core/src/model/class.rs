//! Class-like declarations: classes, interfaces, traits and enums

use super::{MethodRecord, Modifier, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Trait,
    Enum,
}

/// A declared class, interface, trait or enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassRecord {
    /// Content-derived id, empty until the repair pass stamps it
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub kind: ClassKind,

    pub namespace: Option<String>,

    #[serde(default)]
    pub file: String,

    pub start_line: usize,

    pub end_line: usize,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub modifiers: Vec<Modifier>,

    /// Base classes (or parent interfaces), by name only
    #[serde(default)]
    pub extends: Vec<ClassRef>,

    #[serde(default)]
    pub implements: Vec<ClassRef>,

    /// Traits pulled in with `use` inside the body
    #[serde(default)]
    pub uses: Vec<ClassRef>,

    #[serde(default)]
    pub properties: Vec<PropertyRecord>,

    #[serde(default)]
    pub methods: Vec<MethodRecord>,

    #[serde(default)]
    pub is_interface: bool,
}

impl ClassRecord {
    /// Copy with every method reduced to its index summary.
    pub fn summary(&self) -> Self {
        Self {
            methods: self.methods.iter().map(MethodRecord::summary).collect(),
            ..self.clone()
        }
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.extends.first().map(|r| r.name.as_str())
    }
}

/// A by-name pointer to another class.
///
/// Serialized as `{"Name": null}`: the slot is never filled during a run,
/// lookups go through the class-name index at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Option<String>>",
    into = "BTreeMap<String, Option<String>>"
)]
pub struct ClassRef {
    pub name: String,
}

impl ClassRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TryFrom<BTreeMap<String, Option<String>>> for ClassRef {
    type Error = String;

    fn try_from(map: BTreeMap<String, Option<String>>) -> Result<Self, Self::Error> {
        let mut keys = map.into_keys();
        match (keys.next(), keys.next()) {
            (Some(name), None) => Ok(ClassRef { name }),
            _ => Err("class reference must have exactly one name".to_string()),
        }
    }
}

impl From<ClassRef> for BTreeMap<String, Option<String>> {
    fn from(class_ref: ClassRef) -> Self {
        BTreeMap::from([(class_ref.name, None)])
    }
}

/// A property or class constant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyRecord {
    /// Property name with its `$`, constant name without
    pub name: String,

    /// Default value text, verbatim
    pub default: Option<String>,

    /// Declared type, or the literal shape of the default
    #[serde(rename = "type")]
    pub prop_type: Option<String>,

    pub start_line: usize,

    pub end_line: usize,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}
