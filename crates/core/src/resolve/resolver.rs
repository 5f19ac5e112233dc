//! Call-site resolution against the cross-file index
//!
//! Every resolvable call goes through the same chain of filters:
//!
//! 1. lookup: by name for free functions; by full method name, then class
//!    name, then bare method name for class-bound calls
//! 2. locality: native calls keep same-file candidates only; other calls are
//!    narrowed by include/`use` hints when the import filter is on
//! 3. ambiguity cap on what is left
//! 4. arity: declared parameters must cover the passed arguments
//! 5. visibility: private members drop out for non-native class calls
//!
//! An empty set at any stage means the call is unresolved. Nothing here
//! returns an error.

use super::index::CrossFileIndex;
use crate::builtins::CONSTRUCTOR;
use crate::model::{CallSite, ClassRecord, MethodRecord, MethodType, ParsedFile, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Candidate sets above this size are dropped as unreliable.
pub const DEFAULT_AMBIGUITY_CAP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Narrow non-native candidates by include and `use` hints
    pub import_filter: bool,
    pub ambiguity_cap: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            import_filter: false,
            ambiguity_cap: DEFAULT_AMBIGUITY_CAP,
        }
    }
}

/// Outcome of resolving one call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Candidate id -> declaring file
    Resolved(BTreeMap<String, String>),
    /// Too many candidates; carries how many
    Ambiguous(usize),
    Unresolved,
    Builtin,
    Dynamic,
}

impl Resolution {
    /// Value stored in [`CallSite::may_be_source`]: the candidates, an empty
    /// map when ambiguous, nothing otherwise.
    pub fn into_may_be_source(self) -> Option<BTreeMap<String, String>> {
        match self {
            Resolution::Resolved(candidates) => Some(candidates),
            Resolution::Ambiguous(_) => Some(BTreeMap::new()),
            Resolution::Unresolved | Resolution::Builtin | Resolution::Dynamic => None,
        }
    }
}

/// Call sites counted by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStats {
    pub resolved: usize,
    pub unresolved: usize,
    pub ambiguous: usize,
    pub builtin: usize,
    pub dynamic: usize,
}

impl ResolutionStats {
    pub fn record(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Resolved(_) => self.resolved += 1,
            Resolution::Ambiguous(_) => self.ambiguous += 1,
            Resolution::Unresolved => self.unresolved += 1,
            Resolution::Builtin => self.builtin += 1,
            Resolution::Dynamic => self.dynamic += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.resolved + self.unresolved + self.ambiguous + self.builtin + self.dynamic
    }
}

/// A declaration a call may target.
///
/// `new C()` on a class with no `__construct` targets the class itself.
#[derive(Debug, Clone, Copy)]
enum Candidate<'i> {
    Method(&'i MethodRecord),
    ImplicitConstructor(&'i ClassRecord),
}

impl<'i> Candidate<'i> {
    fn id(&self) -> &'i str {
        match self {
            Candidate::Method(m) => &m.id,
            Candidate::ImplicitConstructor(c) => &c.id,
        }
    }

    fn file(&self) -> &'i str {
        match self {
            Candidate::Method(m) => &m.file,
            Candidate::ImplicitConstructor(c) => &c.file,
        }
    }

    fn namespace(&self) -> Option<&'i str> {
        match self {
            Candidate::Method(m) => m.namespace.as_deref(),
            Candidate::ImplicitConstructor(c) => c.namespace.as_deref(),
        }
    }

    /// Declared parameters cover `arguments`. An implicit constructor takes
    /// whatever it is given.
    fn accepts(&self, arguments: usize) -> bool {
        match self {
            Candidate::Method(m) => m.parameters.len() >= arguments,
            Candidate::ImplicitConstructor(_) => true,
        }
    }

    fn is_private(&self) -> bool {
        match self {
            Candidate::Method(m) => m.visibility == Visibility::Private,
            Candidate::ImplicitConstructor(_) => false,
        }
    }
}

/// Resolves call sites against a built index
pub struct CallResolver<'i> {
    index: &'i CrossFileIndex,
    options: ResolveOptions,
}

impl<'i> CallResolver<'i> {
    pub fn new(index: &'i CrossFileIndex, options: ResolveOptions) -> Self {
        Self { index, options }
    }

    /// Resolve one call site.
    pub fn resolve(&self, call: &CallSite) -> Resolution {
        match call.method_type {
            MethodType::Builtin => Resolution::Builtin,
            MethodType::Dynamic => Resolution::Dynamic,
            MethodType::General => self.select(call, self.function_candidates(call), false),
            MethodType::Construct | MethodType::Magic | MethodType::ClassMethod => {
                self.select(call, self.class_candidates(call), true)
            }
        }
    }

    /// Resolve every call site in place and count the outcomes.
    pub fn resolve_all(&self, files: &mut BTreeMap<String, ParsedFile>) -> ResolutionStats {
        let mut stats = ResolutionStats::default();
        for file in files.values_mut() {
            for declaration in file.declarations_mut() {
                for call in declaration.calls.iter_mut() {
                    let resolution = self.resolve(call);
                    stats.record(&resolution);
                    call.may_be_source = resolution.into_may_be_source();
                }
            }
        }
        stats
    }

    fn function_candidates(&self, call: &CallSite) -> Vec<Candidate<'i>> {
        self.index
            .function_ids_named(&call.name)
            .iter()
            .filter_map(|id| self.index.function(id))
            .map(Candidate::Method)
            .collect()
    }

    /// Class ids by full method name, then class name, then (except for
    /// constructors) bare method name; the first non-empty lookup wins.
    fn class_candidates(&self, call: &CallSite) -> Vec<Candidate<'i>> {
        let index = self.index;
        let mut class_ids = index.class_ids_with_method_fullname(&call.fullname);
        if class_ids.is_empty() {
            if let Some(class_name) = &call.class_name {
                class_ids = index.class_ids_named(class_name);
            }
        }
        if class_ids.is_empty() && call.method_type != MethodType::Construct {
            class_ids = index.class_ids_with_method_name(&call.name);
        }

        let mut candidates = Vec::new();
        for class in class_ids.iter().filter_map(|id| index.class(id)) {
            let before = candidates.len();
            candidates.extend(
                class
                    .methods
                    .iter()
                    .filter(|m| declares_target(m, call))
                    .map(Candidate::Method),
            );
            let declares_constructor = class
                .methods
                .iter()
                .any(|m| m.name.eq_ignore_ascii_case(CONSTRUCTOR));
            if call.method_type == MethodType::Construct
                && candidates.len() == before
                && !declares_constructor
            {
                candidates.push(Candidate::ImplicitConstructor(class));
            }
        }
        candidates
    }

    /// Locality, cap, arity and visibility over the looked-up candidates.
    fn select(&self, call: &CallSite, candidates: Vec<Candidate<'i>>, class_bound: bool) -> Resolution {
        let mut candidates = if call.is_native {
            same_file(call, candidates)
        } else if self.options.import_filter && call.has_import_hints() {
            filter_by_imports(call, &candidates)
        } else {
            candidates
        };

        if candidates.len() > self.options.ambiguity_cap {
            debug!(
                call = %call.fullname,
                line = call.start_line,
                "{} candidates, dropping as ambiguous",
                candidates.len()
            );
            return Resolution::Ambiguous(candidates.len());
        }

        let arguments = call.arguments.len();
        candidates.retain(|c| c.accepts(arguments));
        if class_bound && !call.is_native {
            candidates.retain(|c| !c.is_private());
        }

        if candidates.is_empty() {
            return Resolution::Unresolved;
        }
        if candidates.len() > self.options.ambiguity_cap {
            return Resolution::Ambiguous(candidates.len());
        }
        Resolution::Resolved(
            candidates
                .iter()
                .map(|c| (c.id().to_string(), c.file().to_string()))
                .collect(),
        )
    }
}

fn same_file<'i>(call: &CallSite, candidates: Vec<Candidate<'i>>) -> Vec<Candidate<'i>> {
    let Some(file) = call.file.as_deref() else {
        return Vec::new();
    };
    candidates.into_iter().filter(|c| c.file() == file).collect()
}

/// Candidates whose namespace contains a hinted namespace, then candidates
/// whose file contains a hinted include path; first occurrence wins.
fn filter_by_imports<'i>(call: &CallSite, candidates: &[Candidate<'i>]) -> Vec<Candidate<'i>> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for hint in call.may_namespaces.iter().map(|ns| ns.replace('\\', "/")) {
        if hint.is_empty() {
            continue;
        }
        for candidate in candidates {
            let matches = candidate
                .namespace()
                .is_some_and(|ns| ns.replace('\\', "/").contains(&hint));
            if matches && seen.insert(candidate.id()) {
                kept.push(*candidate);
            }
        }
    }

    for hint in call.may_files.iter().filter_map(|f| normalize_import_path(f)) {
        for candidate in candidates {
            if candidate.file().contains(&hint) && seen.insert(candidate.id()) {
                kept.push(*candidate);
            }
        }
    }

    kept
}

/// Reduce an include/require expression to a path fragment comparable with
/// project-relative file paths, or `None` when nothing usable is left.
///
/// `__DIR__ . '/lib/db.php'` becomes `lib/db.php`.
pub fn normalize_import_path(raw: &str) -> Option<String> {
    let mut path = raw.to_string();
    for marker in ["dirname", "__FILE__", "(", ")", "ROOT_PATH"] {
        path = path.replace(marker, "");
    }

    let underscores = path.matches("__").count();
    if underscores > 0 && underscores % 2 == 0 {
        if let Some(tail) = path.rsplit("__").next() {
            path = tail.to_string();
        }
    }

    if path.matches('.').count() >= 2 {
        if let Some((_, rest)) = path.split_once('.') {
            path = rest.to_string();
        }
    }

    let path = path
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '\\' | '/' | '.' | '"' | '\''))
        .replace('\\', "/");

    if path.is_empty() || (path.contains(".php") && path.len() <= 4) {
        return None;
    }
    Some(path)
}

/// Whether a class method is the one `call` names. Constructors match
/// regardless of case.
fn declares_target(method: &MethodRecord, call: &CallSite) -> bool {
    if call.method_type == MethodType::Construct {
        return method.name.eq_ignore_ascii_case(CONSTRUCTOR);
    }
    method.fullname == call.fullname || method.name == call.name
}
