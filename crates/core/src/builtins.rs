//! Builtin function names and language-reserved method hooks
//!
//! Both tables are process-wide and immutable: the builtin set is built on
//! first use from a list compiled into the binary, and is shared read-only by
//! every parsing worker.

use std::collections::HashSet;
use std::sync::OnceLock;

const BUILTIN_FUNCTION_LIST: &str = include_str!("../data/php_builtin_functions.txt");

/// Method names PHP reserves for object lifecycle and interception hooks.
pub const MAGIC_METHODS: &[&str] = &[
    "__construct",
    "__destruct",
    "__call",
    "__callStatic",
    "__get",
    "__set",
    "__isset",
    "__unset",
    "__toString",
    "__invoke",
    "__clone",
    "__sleep",
    "__wakeup",
    "__serialize",
    "__unserialize",
    "__set_state",
    "__debugInfo",
    "__autoload",
];

pub const CONSTRUCTOR: &str = "__construct";

fn builtin_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| parse_name_list(BUILTIN_FUNCTION_LIST).collect())
}

fn parse_name_list(list: &str) -> impl Iterator<Item = &str> {
    list.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Whether `name` is a builtin function. PHP function names are
/// case-insensitive, and a leading `\` (global namespace) is ignored.
pub fn is_builtin_function(name: &str) -> bool {
    let name = name.trim_start_matches('\\');
    let set = builtin_set();
    set.contains(name) || set.contains(name.to_ascii_lowercase().as_str())
}

pub fn is_magic_method(name: &str) -> bool {
    MAGIC_METHODS.iter().any(|m| m.eq_ignore_ascii_case(name))
}

/// Number of names in the builtin set.
pub fn builtin_count() -> usize {
    builtin_set().len()
}
