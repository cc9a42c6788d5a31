//! Tracing subscriber initialization.
//!
//! Logs go to stderr so that command output on stdout stays machine-readable.
//! The filter comes from, in order: `GLINT_LOG`, `RUST_LOG`, then the `-v` count
//! (warnings by default).

use std::{env, io};

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable with glint-specific filter directives.
const LOG_ENV: &str = "GLINT_LOG";

/// Crates whose events `-v` raises.
const GLINT_TARGETS: [&str; 5] = [
    "glint",
    "glint_config",
    "glint_fetch",
    "glint_highlight",
    "glint_query",
];

/// Maps the `-v` count to a level for glint's own crates.
fn verbosity_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Builds the directive string used when no environment filter is set.
fn default_directives(verbose: u8) -> String {
    if verbose == 0 {
        return Level::WARN.to_string();
    }
    let level = verbosity_level(verbose);
    let mut directives = vec![Level::WARN.to_string()];
    directives.extend(GLINT_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Builds the filter; unparseable environment values fall through to the next source.
fn build_env_filter(verbose: u8) -> EnvFilter {
    if let Ok(directives) = env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(default_directives(verbose)).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber. Call once, before any command runs.
pub fn init_subscriber(verbose: u8) {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .without_time()
        .compact();
    tracing_subscriber::registry()
        .with(build_env_filter(verbose))
        .with(layer)
        .init();
}
