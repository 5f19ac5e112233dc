//! Initialize .callmap.toml configuration

use anyhow::Result;
use callmap_core::config::{CallmapConfig, CONFIG_FILE_NAME};
use colored::Colorize;
use std::path::Path;

pub fn run(path: Option<&Path>) -> Result<()> {
    let target_path = path.unwrap_or_else(|| Path::new("."));
    let config_path = target_path.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        eprintln!(
            "  {}: {} already exists at {}",
            "warn".yellow(),
            CONFIG_FILE_NAME,
            config_path.display()
        );
        return Ok(());
    }

    let config = CallmapConfig::default();
    config.save(&config_path)?;

    eprintln!("  {} {}", "Created".green(), config_path.display());
    eprintln!("\n  You can now customize the configuration and run:");
    eprintln!("    callmap analyze -p {}", target_path.display());

    Ok(())
}
