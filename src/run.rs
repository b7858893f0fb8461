mod cli;
mod stdio;

use anyhow::{Context, Result};
use log::error;
use std::io;
use std::sync::Arc;

use crate::config::{Command, Config};
use crate::db::Ledger;
use crate::import;
use crate::tools::Dispatcher;

pub(crate) fn run(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Tools => cli::print_tools(),
        Command::Serve => {
            let dispatcher = Dispatcher::new(open(config)?, config.row_limit);
            stdio::serve(&dispatcher, io::stdin().lock(), io::stdout().lock())
        }
        Command::Call { tool, arguments } => {
            let dispatcher = Dispatcher::new(open(config)?, config.row_limit);
            cli::call(&dispatcher, &tool, arguments.as_deref())
        }
        Command::Stats => cli::print_stats(&*open(config)?),
        Command::Export { resource, output } => {
            cli::export(&*open(config)?, resource, output.as_deref())
        }
    }
}

/// Ingest the configured QIF file and build the ledger. Nothing is served
/// unless this succeeds.
fn open(config: &Config) -> Result<Arc<Ledger>> {
    let path = config
        .qif_path
        .as_deref()
        .context("No QIF file given; pass --qif or set QIF_PATH")?;
    let normalized = import::ingest_file(path, &config.ingest)
        .inspect_err(|e| error!("Ingestion failed ({}): {e}", e.kind()))
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let ledger = Ledger::build(normalized)?;
    Ok(Arc::new(ledger))
}

#[cfg(test)]
mod tests;
