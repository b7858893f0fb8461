mod config;
mod db;
mod error;
mod export;
mod guard;
mod import;
mod models;
mod run;
mod tools;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let (config, command) = config::Args::parse().into_parts();

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .target(env_logger::Target::Stderr)
        .init();

    run::run(&config, command)
}
