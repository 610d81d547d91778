//! # soch
//!
//! Interactive console for SochDB. Spawns the MCP tool server as a child
//! process and drives it over stdio, one command per line.
//!
//! ## Usage
//!
//! ```bash
//! # Open a database (the path is remembered for next time)
//! soch ./mydb
//!
//! # Reopen the last-used database
//! soch
//! ```
//!
//! Type `help` at the prompt for the command list.

use std::io::Write as _;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, info};

use soch_studio::config::StudioConfig;
use soch_studio::{Console, ConsoleEntry, EntryKind, StdioBridge};

#[derive(Parser, Debug)]
#[command(name = "soch")]
#[command(about = "Interactive console for SochDB")]
#[command(version)]
struct Args {
    /// Database path (defaults to the last-used path)
    db_path: Option<String>,

    /// Command used to spawn the tool server
    #[arg(long, default_value = "sochdb-mcp")]
    server: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Print history entries added since the last call. Input entries are
/// skipped, the terminal already shows what was typed at the prompt.
fn print_new(history: &[ConsoleEntry], printed: &mut usize) {
    if history.len() < *printed {
        // History shrank: the console was cleared. Reprint from the top.
        *printed = 0;
    }
    for entry in &history[*printed..] {
        match entry.kind {
            EntryKind::Input => {}
            EntryKind::Output => println!("{}", entry.text),
            EntryKind::Error => println!("{}", entry.text.red()),
        }
    }
    *printed = history.len();
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Logging goes to stderr, stdout belongs to the console itself
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    let mut config = StudioConfig::load();
    let db_path = args
        .db_path
        .clone()
        .or_else(|| config.last_db_path.clone())
        .context("no database path given and none remembered; run `soch <DB_PATH>`")?;

    info!("Starting soch v{}", env!("CARGO_PKG_VERSION"));

    let bridge = StdioBridge::spawn(&args.server, std::slice::from_ref(&db_path))
        .await
        .with_context(|| format!("failed to start tool server `{}`", args.server))?;

    match bridge.list_tools().await {
        Ok(tools) => debug!("Server ready, {} tools: {}", tools.len(), tools.join(", ")),
        Err(err) => debug!("Could not list tools: {err}"),
    }

    // Only remember the path once the server actually came up on it
    config.remember_path(&db_path);
    if let Err(err) = config.save() {
        debug!("Could not persist config: {err:#}");
    }

    println!("{}", format!("Connected to {db_path}").cyan());

    let mut console = Console::new(bridge);
    let mut printed = 0usize;
    print_new(console.history(), &mut printed);

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "sochdb>".cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let trimmed = line.trim();
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }

        console.execute(&line).await;
        print_new(console.history(), &mut printed);
    }

    console.into_bridge().shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[soch] Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
