//! Callmap CLI - static call-graph resolver

use anyhow::Result;
use callmap_cli::{commands, logging, Cli, Commands};
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Some(Commands::Init { path }) => {
            commands::init::run(path.as_deref())?;
        }
        Some(Commands::Analyze(ref args)) => {
            commands::analyze::run(args)?;
        }
        None => {
            // Default command is analyze with the top-level arguments
            commands::analyze::run(&cli.analyze)?;
        }
    }

    Ok(())
}
