//! End-to-end analysis: discover, parse (or load), repair, index, resolve
//!
//! Parsing is the only parallel stage. Everything after it works on the
//! complete per-file map, keyed by relative path, so the result never
//! depends on the order in which workers finish.

use crate::cache::{ParseCache, ParseCacheMeta};
use crate::config::CallmapConfig;
use crate::discovery::discover_files;
use crate::graph::{annotate_called_by, CallGraph};
use crate::model::{FileFailure, ParsedFile};
use crate::parser::PhpParser;
use crate::resolve::{repair_basic_info, CallResolver, CrossFileIndex, ResolutionStats, ResolveOptions};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Knobs for one analysis run, usually derived from [`CallmapConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeOptions {
    pub project_name: String,
    pub workers: usize,
    /// Directory fragments skipped during discovery
    pub exclude_dirs: Vec<String>,
    /// Gitignore-style exclude globs
    pub ignore_paths: Vec<String>,
    pub use_cache: bool,
    /// Relative paths are taken from the project root
    pub cache_dir: PathBuf,
    pub resolve: ResolveOptions,
}

impl AnalyzeOptions {
    pub fn from_config(config: &CallmapConfig) -> Self {
        Self {
            project_name: config.general.project_name.clone(),
            workers: config.general.workers.max(1),
            exclude_dirs: config.ignore.dirs.clone(),
            ignore_paths: config.ignore.paths.clone(),
            use_cache: config.cache.enabled,
            cache_dir: PathBuf::from(&config.cache.dir),
            resolve: ResolveOptions {
                import_filter: config.resolve.import_filter,
                ambiguity_cap: config.resolve.ambiguity_cap,
            },
        }
    }
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self::from_config(&CallmapConfig::default())
    }
}

/// Everything one run produces
#[derive(Debug)]
pub struct AnalysisResult {
    pub project_root: PathBuf,
    /// Resolved records keyed by relative path
    pub files: BTreeMap<String, ParsedFile>,
    pub failures: Vec<FileFailure>,
    pub stats: ResolutionStats,
    pub graph: CallGraph,
    /// Number of files discovered
    pub discovered: usize,
    /// Parse results came from the cache
    pub from_cache: bool,
}

/// Parse output before any cross-file pass
#[derive(Debug)]
pub struct ParseOutcome {
    pub files: BTreeMap<String, ParsedFile>,
    pub failures: Vec<FileFailure>,
    pub from_cache: bool,
}

pub struct Analyzer {
    root: PathBuf,
    options: AnalyzeOptions,
    parser: PhpParser,
}

impl Analyzer {
    /// Fails when `root` is not an existing directory.
    pub fn new(root: &Path, options: AnalyzeOptions) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Project path {} does not exist", root.display()))?;
        if !root.is_dir() {
            anyhow::bail!("Project path {} is not a directory", root.display());
        }
        Ok(Self {
            root,
            options,
            parser: PhpParser::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &AnalyzeOptions {
        &self.options
    }

    pub fn cache(&self) -> ParseCache {
        let cache_dir = if self.options.cache_dir.is_absolute() {
            self.options.cache_dir.clone()
        } else {
            self.root.join(&self.options.cache_dir)
        };
        ParseCache::new(
            &cache_dir,
            &self.options.project_name,
            &self.root,
            &self.options.exclude_dirs,
        )
    }

    /// Run every stage.
    pub fn run(&self) -> Result<AnalysisResult> {
        // ── 1. Discover ──────────────────────────────────────────────
        let files = self.discover()?;

        // ── 2. Parse or load ─────────────────────────────────────────
        let parsed = self.parse(&files)?;

        // ── 3. Resolve ───────────────────────────────────────────────
        let (files_map, stats, graph) = resolve_project(parsed.files, self.options.resolve);

        Ok(AnalysisResult {
            project_root: self.root.clone(),
            files: files_map,
            failures: parsed.failures,
            stats,
            graph,
            discovered: files.len(),
            from_cache: parsed.from_cache,
        })
    }

    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let files = discover_files(
            &self.root,
            self.parser.file_extensions(),
            &self.options.ignore_paths,
            &self.options.exclude_dirs,
        )?;
        info!(count = files.len(), "discovered source files");
        Ok(files)
    }

    /// Parse `files`, reusing the cache when it is enabled and still valid.
    ///
    /// A corrupt cache surfaces as a [`crate::cache::CacheError`] inside the
    /// returned error; nothing is parsed in that case.
    pub fn parse(&self, files: &[PathBuf]) -> Result<ParseOutcome> {
        if !self.options.use_cache {
            let (files, failures) = self.parser.parse_files(&self.root, files, self.options.workers);
            return Ok(ParseOutcome {
                files,
                failures,
                from_cache: false,
            });
        }

        let cache = self.cache();
        let checksums = ParseCache::build_file_checksums(&self.root, files);

        if let Some((cached, meta)) = cache.load()? {
            if ParseCache::is_cache_valid(&meta, &checksums) {
                info!(path = %cache.data_path().display(), "using cached parse results");
                return Ok(ParseOutcome {
                    files: cached,
                    failures: meta.failures,
                    from_cache: true,
                });
            }
            debug!("parse cache is stale");
        }

        let (parsed, failures) = self.parser.parse_files(&self.root, files, self.options.workers);
        cache.save(&parsed, &ParseCacheMeta::new(checksums, failures.clone()))?;
        Ok(ParseOutcome {
            files: parsed,
            failures,
            from_cache: false,
        })
    }
}

/// Repair, index, resolve and link raw parse results.
pub fn resolve_project(
    mut files: BTreeMap<String, ParsedFile>,
    options: ResolveOptions,
) -> (BTreeMap<String, ParsedFile>, ResolutionStats, CallGraph) {
    repair_basic_info(&mut files);

    let index = CrossFileIndex::build(&files);
    debug!(
        functions = index.function_count(),
        classes = index.class_count(),
        "built cross-file index"
    );

    let stats = CallResolver::new(&index, options).resolve_all(&mut files);
    let graph = CallGraph::build(&files);
    annotate_called_by(&mut files, &graph);

    (files, stats, graph)
}
