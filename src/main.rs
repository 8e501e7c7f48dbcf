//! ttlru - Interactive cache shell
//!
//! Reads commands from stdin, one per line, and prints each result on stdout.

use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttlru::{shell::Shell, CacheConfig};

/// Main entry point for the cache shell.
///
/// # Startup Sequence
/// 1. Load configuration from a JSON file (first argument) or defaults, then
///    apply environment overrides
/// 2. Initialize tracing subscriber for logging (stderr)
/// 3. Create the cache with configured parameters
/// 4. Execute stdin lines until EOF or `QUIT`
fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path))?;
            CacheConfig::from_json(&json)
                .with_context(|| format!("Invalid config file {}", path))?
                .with_env_overrides()
        }
        None => CacheConfig::from_env(),
    };

    // Defaults to the configured filter, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!(
        "Configuration loaded: capacity={}, default_ttl_ms={:?}",
        config.capacity, config.default_ttl_ms
    );

    let mut shell = Shell::from_config(&config).context("Failed to create cache")?;
    info!("Cache initialized");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().eq_ignore_ascii_case("quit") {
            break;
        }

        match shell.execute_line(&line) {
            Ok(Some(response)) => writeln!(stdout, "{}", response)?,
            Ok(None) => {}
            Err(err) => {
                warn!("Command failed: {}", err);
                writeln!(stdout, "ERR {}", err)?;
            }
        }
        stdout.flush()?;
    }

    info!("Shell shutdown complete");
    Ok(())
}
