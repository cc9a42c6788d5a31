//! Command implementations and dispatch.

pub mod config;
pub mod highlight;
mod shared;
pub mod terms;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Highlight(cmd) => highlight::run(ctx, &cmd),
        Commands::Terms(cmd) => terms::run(ctx, &cmd),
        Commands::Config(args) => config::run(ctx, &args),
    }
}
