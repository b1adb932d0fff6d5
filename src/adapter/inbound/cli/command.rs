//! Command-line interface definitions.
//!
//! Defines the CLI structure for release-tagger using `clap`. Global flags
//! control output formatting; each subcommand carries the overrides it
//! needs on top of the configuration file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::EntityRef;

/// Tag ESXi hosts with the release name of their build
#[derive(Parser, Debug)]
#[command(name = "release-tagger")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file [default: ~/.release-tagger/config.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log level (overrides config, `RUST_LOG` overrides both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tag every connected host with the release name of its build
    Reconcile(ReconcileArgs),

    /// Load the release catalog and inspect it
    Catalog(CatalogArgs),
}

/// Arguments for the `reconcile` command.
///
/// All optional fields override the corresponding configuration values.
#[derive(Args, Debug, Default)]
pub struct ReconcileArgs {
    /// Catalog file path or http(s) URL
    #[arg(long, value_name = "LOCATION")]
    pub catalog: Option<String>,

    /// Tag category holding the release tags
    #[arg(long)]
    pub category: Option<String>,

    /// Restrict to an inventory container, e.g. cluster:domain-c8
    #[arg(long, value_name = "KIND:ID")]
    pub scope: Option<EntityRef>,

    /// Abort the run after this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Validate TLS certificates when fetching the catalog
    #[arg(long)]
    pub strict_tls: bool,

    /// Skip TLS certificate validation for vCenter
    #[arg(long)]
    pub insecure: bool,
}

/// Arguments for the `catalog` command.
#[derive(Args, Debug, Default)]
pub struct CatalogArgs {
    /// Catalog file path or http(s) URL
    #[arg(long)]
    pub location: Option<String>,

    /// Show the release a build maps to
    #[arg(long)]
    pub build: Option<String>,

    /// Validate TLS certificates when fetching the catalog
    #[arg(long)]
    pub strict_tls: bool,
}
