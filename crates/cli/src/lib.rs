//! Callmap CLI library, exposed for integration tests

pub mod commands;
pub mod logging;
pub mod progress;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "callmap")]
#[command(about = "Static call-graph resolution for PHP projects", long_about = None)]
#[command(version = callmap_core::VERSION)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Analyze arguments when no subcommand is given
    #[command(flatten)]
    pub analyze: AnalyzeArgs,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a project and resolve its call sites (default command)
    Analyze(AnalyzeArgs),

    /// Initialize .callmap.toml configuration
    Init {
        /// Path to initialize (default: current directory)
        path: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Root directory of the PHP project
    #[arg(short = 'p', long)]
    pub project_path: Option<PathBuf>,

    /// Project name used in cache and output file names
    #[arg(short = 'n', long)]
    pub project_name: Option<String>,

    /// Parser threads (default: 1)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Output file prefix (default: {project}.parsed)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Parse everything, ignoring and not writing the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Delete this project's cache before running
    #[arg(long)]
    pub clear_cache: bool,

    /// Extra directory fragments to skip, added to the configured list
    #[arg(short = 'e', long = "exclude-dir", num_args = 1..)]
    pub exclude_dirs: Vec<String>,

    /// Narrow non-local candidates by include and use hints
    #[arg(long)]
    pub import_filter: bool,
}
