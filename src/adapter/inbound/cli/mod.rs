//! CLI module graph.

pub mod catalog;
pub mod command;
pub mod diagnostic;
pub mod output;
pub mod paths;
pub mod reconcile;

use std::path::Path;

use command::{Cli, Commands};

use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Load the configuration named on the command line, or the default one.
///
/// A missing file at the default location means defaults; a missing file
/// that was named explicitly is an error.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Config::load_or_default(paths::default_config()),
    }
}

/// Apply `--log-level` / `--json-logs` on top of the file's logging section.
pub fn apply_log_flags(cli: &Cli, config: &mut Config) {
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json_logs {
        config.logging.format = "json".into();
    }
}

/// Dispatch the parsed subcommand.
///
/// # Errors
///
/// Propagates the command's failure.
pub async fn dispatch(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Commands::Reconcile(args) => reconcile::execute(config, args).await,
        Commands::Catalog(args) => catalog::execute(config, args).await,
    }
}

