//! Command-line entry point
//!
//! Parses arguments, loads and merges configuration, initializes logging and
//! dispatches to the command handler.

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use anyhow::Context;
use clap::Parser;

use crate::config::settings::Settings;
use crate::logger::init_logger;

/// Full CLI run as used by `main`
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let merger = ConfigurationMerger::from_cli(&cli).context("Failed to load configuration")?;
    let settings = merger
        .merge_cli_args(&cli)
        .context("Invalid configuration")?;

    init_logger_from_settings(&settings)?;

    execute_command(&cli, settings, merger.environment()).await
}

pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .context("Invalid logger configuration")?;

    init_logger(logger_config).context("Failed to initialize logger")
}
