//! Callmap Core - static call-graph resolution for PHP projects
//!
//! This crate provides the analysis engine behind the `callmap` CLI:
//! - declaration and call-site extraction via Tree-sitter
//! - cross-file indexing of functions, classes and methods
//! - heuristic call resolution into candidate sets
//! - parse-result caching and JSON output

pub mod builtins;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod graph;
pub mod ids;
pub mod model;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod resolve;

pub use cache::{CacheError, ParseCache, ParseCacheMeta};
pub use config::CallmapConfig;
pub use discovery::discover_files;
pub use graph::{CallEdge, CallGraph};
pub use model::{
    CallSite, ClassRecord, MethodRecord, MethodType, ParsedFile, Visibility, NOT_IN_METHOD,
};
pub use output::{write_outputs, Category, OutputOptions};
pub use parser::{guess_method_type, ParseError, PhpParser};
pub use pipeline::{resolve_project, AnalysisResult, AnalyzeOptions, Analyzer};
pub use resolve::{CallResolver, CrossFileIndex, Resolution, ResolutionStats, ResolveOptions};

/// Callmap version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
