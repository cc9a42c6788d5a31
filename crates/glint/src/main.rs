//! glint: fetch-phase highlighting from the command line.
//!
//! The `glint` binary runs the fetch phase over a JSON fixture holding field
//! mappings, documents, a parsed query tree and the child hits an executor would
//! have recorded. It prints the highlighted fragments, offsets and children of
//! every hit, shows which terms a query highlights, and shows the effective
//! highlight configuration.

#![warn(missing_docs)]

mod cli;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::{CommandContext, args::Cli, commands, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_subscriber(cli.verbose);

    let ctx = match CommandContext::load() {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };
    commands::run(cli.command, &ctx)
}
