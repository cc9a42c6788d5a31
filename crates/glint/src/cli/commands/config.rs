//! Implementation of `glint config`.

use std::process::ExitCode;

use crate::cli::{args::ConfigArgs, context::CommandContext, output::dim};

/// Shows effective configuration settings.
pub fn run(ctx: &CommandContext, args: &ConfigArgs) -> ExitCode {
    let files = ctx.config_files(args);
    if files.is_empty() {
        eprintln!("{}", dim("No configuration files found; showing defaults."));
    }
    for path in &files {
        eprintln!("{}", dim(&format!("# {}", path.display())));
    }

    let config = match ctx.config(args, None) {
        Ok(config) => config,
        Err(code) => return code,
    };
    match config.settings_to_toml() {
        Ok(toml) => {
            print!("{toml}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
