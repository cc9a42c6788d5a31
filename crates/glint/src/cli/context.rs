//! Shared context for running CLI commands.

use std::{env, path::PathBuf, process::ExitCode};

use glint_config::{
    Config, ParsedConfig, RawConfig, discover_config_files, merge_configs, parse_config_file,
};
use tracing::debug;

use crate::cli::{args::ConfigArgs, output::warning};

/// Origin recorded for the request layer of a merged configuration.
const REQUEST_SOURCE: &str = "request";

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
}

impl CommandContext {
    /// Loads the current directory.
    pub fn load() -> Result<Self, ExitCode> {
        match env::current_dir() {
            Ok(cwd) => Ok(Self { cwd }),
            Err(e) => {
                eprintln!("error: could not determine current directory: {e}");
                Err(ExitCode::FAILURE)
            }
        }
    }

    /// Configuration files to read, highest precedence first.
    pub fn config_files(&self, args: &ConfigArgs) -> Vec<PathBuf> {
        match &args.path {
            Some(path) => vec![path.clone()],
            None => discover_config_files(&self.cwd),
        }
    }

    /// Merges the request layer (if any) over the configuration files and prints
    /// validation warnings to stderr.
    pub fn config(
        &self,
        args: &ConfigArgs,
        request: Option<RawConfig>,
    ) -> Result<Config, ExitCode> {
        let mut layers = Vec::new();
        if let Some(config) = request {
            layers.push(ParsedConfig {
                source: REQUEST_SOURCE.to_string(),
                config,
            });
        }
        for path in self.config_files(args) {
            match parse_config_file(&path) {
                Ok(config) => layers.push(ParsedConfig {
                    source: path.display().to_string(),
                    config,
                }),
                Err(e) => {
                    eprintln!("error: failed to load configuration: {e}");
                    return Err(ExitCode::FAILURE);
                }
            }
        }

        debug!(
            layers = ?layers.iter().map(|l| l.source.as_str()).collect::<Vec<_>>(),
            "merging configuration"
        );
        let config = merge_configs(&layers);
        for w in config.validate() {
            eprintln!("{}", warning(&format!("warning: {w}")));
        }
        Ok(config)
    }
}
