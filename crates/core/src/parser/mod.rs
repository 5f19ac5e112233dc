//! PHP source extraction: one [`ParsedFile`] per source file
//!
//! Extraction runs in fixed order over a single tree: namespaces first, then
//! the file's own function and class names, then object bindings, and only
//! then declarations and their call sites. Call-site extraction needs all of
//! the earlier results to decide whether a name is declared locally.

pub mod calls;
pub mod declarations;
pub mod imports;
pub mod objects;
pub mod syntax;
pub mod variables;

pub use calls::guess_method_type;
pub use syntax::QuerySet;

use crate::discovery::relative_path;
use crate::model::{FileFailure, NamespaceRecord, ObjectBinding, ParsedFile};
use declarations::DECLARATION_SCOPES;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use syntax::{enclosing, start_line};
use thiserror::Error;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser, Tree};

/// Error types for parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    ParseFailed(String),

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    #[error("Invalid query pattern: {0}")]
    Query(String),
}

/// Read-only state for extracting one file
pub(crate) struct FileContext<'a> {
    pub source: &'a str,
    pub queries: &'a QuerySet,
    pub namespaces: Vec<NamespaceRecord>,
    /// Functions declared in this file
    pub function_names: HashSet<String>,
    /// Classes, interfaces, traits and enums declared in this file
    pub class_names: HashSet<String>,
    pub objects: Vec<ObjectBinding>,
    /// Last line of the file
    pub file_end: usize,
}

impl FileContext<'_> {
    pub fn namespace_at(&self, line: usize) -> Option<String> {
        crate::model::namespace_at(&self.namespaces, line).map(|ns| ns.name.clone())
    }

    /// Class bound to `object` at `node`: among bindings whose range covers
    /// the call, the most recent assignment wins. Inside a named function or
    /// method only bindings made within it count.
    pub fn bound_class(&self, object: &str, node: &Node) -> Option<&str> {
        let line = start_line(node);
        let scope_start = enclosing(node, DECLARATION_SCOPES).map(|scope| start_line(&scope));
        self.objects
            .iter()
            .filter(|b| b.object == object && b.start_line <= line && line <= b.end_line)
            .filter(|b| scope_start.map_or(true, |start| b.start_line >= start))
            .max_by_key(|b| b.start_line)
            .map(|b| b.class_name.as_str())
    }

    pub fn is_local_class(&self, name: &str) -> bool {
        self.class_names.contains(name)
    }

    pub fn is_local_function(&self, name: &str) -> bool {
        self.function_names.contains(name)
    }
}

/// PHP parser holding the grammar and its compiled queries
pub struct PhpParser {
    language: tree_sitter::Language,
    queries: QuerySet,
}

impl PhpParser {
    pub fn new() -> Result<Self, ParseError> {
        let language: tree_sitter::Language = tree_sitter_php::LANGUAGE_PHP.into();
        let queries = QuerySet::new(&language)?;
        Ok(Self { language, queries })
    }

    /// File extensions this parser handles
    pub fn file_extensions(&self) -> &[&str] {
        &[".php"]
    }

    fn create_parser(&self) -> Result<Parser, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }

    fn parse_tree(&self, source: &str) -> Result<Tree, ParseError> {
        let mut parser = self.create_parser()?;
        parser
            .parse(source, None)
            .ok_or_else(|| ParseError::ParseFailed("Failed to parse PHP source".to_string()))
    }

    /// Read and extract a file. Bytes that are not valid UTF-8 are replaced
    /// rather than rejected; legacy PHP sources are often not UTF-8.
    pub fn parse_file(&self, file_path: &Path) -> Result<ParsedFile, ParseError> {
        let bytes = std::fs::read(file_path)?;
        let source = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                debug!(file = %file_path.display(), "decoding non-UTF-8 source lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        self.parse_source(&source)
    }

    /// Extract declarations, call sites, imports and variables from source.
    ///
    /// File paths and ids are left empty; the repair pass stamps them once the
    /// whole project is parsed.
    pub fn parse_source(&self, source: &str) -> Result<ParsedFile, ParseError> {
        let tree = self.parse_tree(source)?;
        let root = tree.root_node();

        let mut ctx = FileContext {
            source,
            queries: &self.queries,
            namespaces: declarations::extract_namespaces(&root, source),
            function_names: HashSet::new(),
            class_names: HashSet::new(),
            objects: Vec::new(),
            file_end: syntax::end_line(&root),
        };
        let (function_names, class_names) = declarations::declared_names(&ctx, &root);
        ctx.function_names = function_names;
        ctx.class_names = class_names;
        ctx.objects = objects::extract_bindings(&ctx, &root);

        let mut methods = declarations::extract_functions(&ctx, &root);
        if let Some(file_level) = calls::extract_file_level(&ctx, &root) {
            methods.push(file_level);
        }

        Ok(ParsedFile {
            methods,
            classes: declarations::extract_classes(&ctx, &root),
            imports: imports::extract_imports(&ctx, &root),
            variables: variables::extract_variables(&ctx, &root),
            namespaces: ctx.namespaces,
            objects: ctx.objects,
        })
    }

    /// Parse every file, fanning out over `workers` threads.
    ///
    /// Each file is extracted into its own record with no shared state; the
    /// results are merged sequentially into a map keyed by relative path, so
    /// the outcome does not depend on completion order. `workers <= 1` runs a
    /// plain sequential loop. Failed files are reported, never fatal.
    pub fn parse_files(
        &self,
        root: &Path,
        files: &[PathBuf],
        workers: usize,
    ) -> (BTreeMap<String, ParsedFile>, Vec<FileFailure>) {
        let parse_one = |file: &PathBuf| (relative_path(root, file), self.parse_file(file));

        let per_file: Vec<(String, Result<ParsedFile, ParseError>)> = if workers <= 1 {
            files.iter().map(parse_one).collect()
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(|| files.par_iter().map(parse_one).collect()),
                Err(e) => {
                    warn!("could not build a {}-thread pool ({}), using the global pool", workers, e);
                    files.par_iter().map(parse_one).collect()
                }
            }
        };

        let mut parsed = BTreeMap::new();
        let mut failures = Vec::new();
        for (path, result) in per_file {
            match result {
                Ok(file) => {
                    parsed.insert(path, file);
                }
                Err(e) => {
                    warn!(file = %path, "skipping file: {}", e);
                    failures.push(FileFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        (parsed, failures)
    }
}
