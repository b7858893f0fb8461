//! Command-line and environment configuration.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

use crate::export::Resource;
use crate::guard::DEFAULT_ROW_LIMIT;
use crate::import::{DateOrder, IngestOptions};

#[derive(Parser, Debug)]
#[command(name = "qifledger")]
#[command(version)]
#[command(about = "Load a Quicken QIF export into a read-only ledger and answer tool calls against it", long_about = None)]
pub(crate) struct Args {
    /// QIF file to load
    #[arg(long, env = "QIF_PATH", global = true)]
    qif: Option<PathBuf>,

    /// How to read ambiguous `a/b/y` dates
    #[arg(long, env = "QIF_DATE_ORDER", value_enum, default_value_t = DateOrder::MonthFirst, global = true)]
    date_order: DateOrder,

    /// Maximum rows a single SQL query may return
    #[arg(long, env = "QIF_ROW_LIMIT", default_value_t = DEFAULT_ROW_LIMIT,
          value_parser = clap::value_parser!(u64).range(1..), global = true)]
    row_limit: u64,

    /// Share of malformed records (0 to 1) above which loading fails
    #[arg(long, env = "QIF_MAX_MALFORMED_RATIO", default_value_t = 0.5,
          value_parser = parse_ratio, global = true)]
    max_malformed_ratio: f64,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, env = "LOG_LEVEL", default_value_t = LevelFilter::Info, global = true)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub(crate) enum Command {
    /// Answer line-delimited JSON-RPC requests on stdin (default)
    Serve,
    /// Run one tool and print its response envelope
    Call {
        /// Tool name, e.g. list_accounts
        tool: String,
        /// Tool arguments as a JSON object
        arguments: Option<String>,
    },
    /// Print ingestion statistics and ledger totals
    Stats,
    /// Write one of the CSV resources
    Export {
        #[arg(value_enum)]
        resource: Resource,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the available tools and their input schemas
    Tools,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) qif_path: Option<PathBuf>,
    pub(crate) ingest: IngestOptions,
    pub(crate) row_limit: u64,
    pub(crate) log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qif_path: None,
            ingest: IngestOptions::default(),
            row_limit: DEFAULT_ROW_LIMIT,
            log_level: LevelFilter::Info,
        }
    }
}

impl Args {
    pub(crate) fn into_parts(self) -> (Config, Command) {
        let config = Config {
            qif_path: self.qif,
            ingest: IngestOptions {
                date_order: self.date_order,
                max_malformed_ratio: self.max_malformed_ratio,
            },
            row_limit: self.row_limit,
            log_level: self.log_level,
        };
        (config, self.command.unwrap_or(Command::Serve))
    }
}

fn parse_ratio(s: &str) -> Result<f64, String> {
    let ratio: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("must be between 0 and 1, got {ratio}"))
    }
}
