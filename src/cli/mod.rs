//! CLI subcommand implementations for the docket binary.

pub mod capture_cmd;
pub mod export_cmd;
pub mod list_cmd;

use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

/// Initialize logging, honoring `RUST_LOG` when set.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "docket=debug" } else { "docket=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Print `message` and block until the operator answers on stdin.
pub fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}
