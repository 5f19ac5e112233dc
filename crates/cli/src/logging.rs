//! Logging initialization: `tracing` to stderr, filtered by verbosity

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count. `None` defers to `RUST_LOG`.
pub fn level_for(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Install the global subscriber. Without `-v`, `RUST_LOG` decides and the
/// default is `warn`. Safe to call more than once.
pub fn init(verbose: u8) {
    let filter = match level_for(verbose) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    // A subscriber installed earlier (tests, embedding) keeps precedence.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
