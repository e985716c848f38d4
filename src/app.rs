// Declare modules
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod formatter;
pub mod models;
pub mod parser;
pub mod scanner;
pub mod service;
pub mod vault;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io;
use std::path::Path;

use self::cli::{Cli, Command};
use self::config::load_settings;
use self::fetch::HttpFetcher;
use self::models::{CancelToken, Report};
use self::service::Screwdriver;
use self::vault::LocalVault;

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// A note that does not exist yet reads as empty.
fn read_note(note: &Path) -> Result<String> {
    match fs::read_to_string(note) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e).context(format!("Failed to read note {:?}", note)),
    }
}

fn write_note(note: &Path, text: &str) -> Result<()> {
    fs::write(note, text).context(format!("Failed to write note {:?}", note))
}

fn summarize(action: &str, report: &Report) {
    let failed = report.failures().count();
    let done = report.succeeded().count();
    if failed > 0 {
        log::warn!("⚠️ {} {} items, {} failed", action, done, failed);
    } else {
        log::info!("🎉 {} {} items", action, done);
    }
}

/// Initializes components and orchestrates data flow.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let args = Cli::parse();
    init_logging(args.verbose);

    // 2. Resolve Configuration
    let settings = load_settings(args.settings.as_deref())?;

    // 3. Wire collaborators
    let vault = LocalVault::new(&args.vault);
    let fetcher = HttpFetcher::new(settings.fetch_timeout());
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            log::warn!("🛑 Cancelling after the current item...");
            cancel.cancel();
        })
        .context("Failed to install Ctrl-C handler")?;
    }
    log::debug!("Vault root: {}", vault.root().display());
    let service = Screwdriver::new(&vault, &fetcher, settings);

    // 4. Run the command
    match args.command {
        Command::Template { note, root } => {
            let document = read_note(&note)?;
            let template = service.create_template(&document, &root)?;
            write_note(&note, &template)?;
            log::info!("📝 Template written to {}", note.display());
        }
        Command::Dump { note, stdout } => {
            let document = read_note(&note)?;
            let dump = service.dump(&document, &cancel)?;
            summarize("Dumped", &dump.report);
            if stdout {
                print!("{}", dump.document);
            } else {
                write_note(&note, &dump.document)?;
            }
        }
        Command::Restore { note } => {
            let document = read_note(&note)?;
            let report = service.restore(&document, &cancel)?;
            summarize("Restored", &report);
        }
    }

    Ok(())
}
