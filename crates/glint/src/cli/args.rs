//! Clap argument definitions for the `glint` CLI.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "glint")]
#[command(about = "Fetch-phase highlighting and parent/child aggregation")]
pub struct Cli {
    /// Log verbosity (-v for debug, -vv for trace); GLINT_LOG and RUST_LOG take precedence
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration file selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Read settings from this file instead of discovering .glint.toml files
    #[arg(long = "config", value_name = "FILE")]
    pub path: Option<PathBuf>,
}

/// Arguments for `glint highlight`.
#[derive(Args, Debug, Clone)]
pub struct HighlightCommand {
    /// Fixture with mappings, documents, query and child hits
    pub fixture: PathBuf,

    /// Configuration file override.
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Return match offsets instead of fragments for every field
    #[arg(long)]
    pub offsets: bool,
}

/// Arguments for `glint terms`.
#[derive(Args, Debug, Clone)]
pub struct TermsCommand {
    /// Fixture whose query is analyzed
    pub fixture: PathBuf,

    /// Configuration file override.
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Include terms that only appear in filters
    #[arg(long)]
    pub filters: bool,

    /// Expand prefix, wildcard and fuzzy patterns against this segment's terms
    #[arg(long, default_value = "0")]
    pub segment: u32,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Supported `glint` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the fetch phase over a fixture and show the highlights of every hit
    Highlight(HighlightCommand),

    /// Show the terms and child queries a fixture's query highlights with
    Terms(TermsCommand),

    /// Show the effective highlight settings
    Config(ConfigArgs),
}
