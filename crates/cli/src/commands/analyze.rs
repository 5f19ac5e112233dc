//! Main analyze command: wires discovery, parsing, cache, resolution and output together

use anyhow::{bail, Result};
use callmap_core::output::default_prefix;
use callmap_core::{
    resolve_project, write_outputs, AnalysisResult, AnalyzeOptions, Analyzer, CacheError,
    CallmapConfig, OutputOptions,
};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

use crate::progress::Step;
use crate::AnalyzeArgs;

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let start = Instant::now();
    let Some(project_path) = args.project_path.as_deref() else {
        bail!("missing required --project-path <PATH>");
    };
    if !project_path.is_dir() {
        bail!(
            "project path {} does not exist or is not a directory",
            project_path.display()
        );
    }

    eprintln!(
        "{}",
        format!(
            "  callmap v{}: analyzing {}",
            callmap_core::VERSION,
            project_path.display()
        )
        .bold()
    );
    eprintln!();

    // ── 1. Config ────────────────────────────────────────────────
    let config = CallmapConfig::find_and_load(project_path)?;
    let options = analyze_options(args, &config);
    debug!(?options, "effective analysis options");
    let analyzer = Analyzer::new(project_path, options)?;

    if args.clear_cache {
        analyzer.cache().clear()?;
    }

    // ── 2. File Discovery ────────────────────────────────────────
    let step = Step::new("Discovering PHP files");
    let files = analyzer.discover()?;
    if files.is_empty() {
        step.skip("No PHP files found");
    } else {
        step.finish(&format!("{} files", files.len()));
    }

    // ── 3. Parse ─────────────────────────────────────────────────
    let step = Step::new("Parsing");
    let parse_start = Instant::now();
    let parsed = match analyzer.parse(&files) {
        Ok(parsed) => parsed,
        Err(e) if e.downcast_ref::<CacheError>().is_some() => {
            step.warn(format!("{:#}; rebuilding the cache", e));
            analyzer.cache().clear()?;
            step.update("Parsing (cache rebuilt)...");
            analyzer.parse(&files)?
        }
        Err(e) => return Err(e),
    };
    let source = if parsed.from_cache { "from cache" } else { "parsed" };
    step.finish(&format!(
        "{} files {}, {} failed ({:.1}s)",
        parsed.files.len(),
        source,
        parsed.failures.len(),
        parse_start.elapsed().as_secs_f64()
    ));

    // ── 4. Resolve ───────────────────────────────────────────────
    let step = Step::new("Resolving calls");
    let from_cache = parsed.from_cache;
    let (resolved, stats, graph) = resolve_project(parsed.files, analyzer.options().resolve);
    step.finish(&format!(
        "{} resolved, {} unresolved, {} ambiguous, {} builtin, {} dynamic",
        stats.resolved, stats.unresolved, stats.ambiguous, stats.builtin, stats.dynamic
    ));

    let result = AnalysisResult {
        project_root: analyzer.root().to_path_buf(),
        files: resolved,
        failures: parsed.failures,
        stats,
        graph,
        discovered: files.len(),
        from_cache,
    };

    // ── 5. Output ────────────────────────────────────────────────
    let step = Step::new("Writing output");
    let prefix = args
        .output
        .clone()
        .or_else(|| config.output.prefix.clone())
        .unwrap_or_else(|| default_prefix(&analyzer.options().project_name));
    let written = write_outputs(
        &result,
        &prefix,
        OutputOptions {
            split: config.output.split,
            pretty: config.output.pretty,
        },
    )?;
    step.finish(&format!("{} files", written.len()));

    print_summary(&result, &written, start);
    Ok(())
}

/// Config values, overridden by whatever was given on the command line.
pub fn analyze_options(args: &AnalyzeArgs, config: &CallmapConfig) -> AnalyzeOptions {
    let mut options = AnalyzeOptions::from_config(config);
    if let Some(name) = &args.project_name {
        options.project_name = name.clone();
    }
    if let Some(workers) = args.workers {
        options.workers = workers.max(1);
    }
    for dir in &args.exclude_dirs {
        if !options.exclude_dirs.contains(dir) {
            options.exclude_dirs.push(dir.clone());
        }
    }
    if args.no_cache {
        options.use_cache = false;
    }
    if args.import_filter {
        options.resolve.import_filter = true;
    }
    options
}

fn print_summary(result: &AnalysisResult, written: &[PathBuf], start: Instant) {
    if !result.failures.is_empty() {
        eprintln!();
        eprintln!("  {}", "Failed files:".yellow());
        for failure in &result.failures {
            eprintln!("    {} {}: {}", "x".red(), failure.path, failure.error);
        }
    }

    eprintln!();
    eprintln!(
        "  {} call sites across {} files, {} graph edges",
        result.stats.total(),
        result.files.len(),
        result.graph.edge_count()
    );
    for path in written {
        eprintln!("  {} {}", "wrote".green(), path.display());
    }
    eprintln!(
        "  {}",
        format!("Finished in {:.1}s", start.elapsed().as_secs_f64()).dimmed()
    );
}
