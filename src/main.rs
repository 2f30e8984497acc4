// Copyright 2026 Docket Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use docket::cli;

#[derive(Parser)]
#[command(
    name = "docket",
    about = "Docket — court cause-list capture engine",
    version,
    after_help = "Run 'docket <command> --help' for details on each command."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a cause-list and capture every case on it
    Capture {
        /// Cause-list URL to open
        url: String,
        /// Maximum number of listing pages to visit
        #[arg(long, default_value = "10")]
        max_pages: usize,
        /// Run with a visible browser window (for filling search forms)
        #[arg(long)]
        headed: bool,
        /// Database file (defaults to ~/.docket/docket.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// List captured cases
    List {
        /// Only cases with a hearing today or tomorrow
        #[arg(long)]
        today_tomorrow: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Database file (defaults to ~/.docket/docket.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Export a stored document to a file
    Export {
        /// Case row id (see `docket list`)
        case_id: i64,
        /// Document kind: primary, secondary or consolidated
        kind: String,
        /// Output file (defaults to the stored filename)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Database file (defaults to ~/.docket/docket.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Capture {
            url,
            max_pages,
            headed,
            db,
        } => cli::capture_cmd::run(&url, max_pages, headed, db).await,
        Commands::List {
            today_tomorrow,
            json,
            db,
        } => cli::list_cmd::run(today_tomorrow, json, db),
        Commands::Export {
            case_id,
            kind,
            out,
            db,
        } => cli::export_cmd::run(case_id, &kind, out, db),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "docket", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
