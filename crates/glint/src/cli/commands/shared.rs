//! Shared helpers for command implementations.

use std::{path::Path, process::ExitCode};

use glint_config::Config;
use glint_fetch::{FetchPhase, MemoryStore};

use crate::cli::{
    args::ConfigArgs,
    context::CommandContext,
    fixture::{Fixture, LoadedFixture},
};

/// A fixture ready to run: parsed, configured and indexed.
pub struct PreparedFixture {
    /// The parsed fixture.
    pub fixture: Fixture,
    /// Fetch phase built from the merged configuration.
    pub phase: FetchPhase,
    /// The indexed documents and resolved references.
    pub loaded: LoadedFixture,
}

/// Reads a fixture, merges its request over the configuration files, lets the
/// caller adjust the merged configuration, then indexes the fixture.
pub fn prepare_fixture(
    ctx: &CommandContext,
    path: &Path,
    config_args: &ConfigArgs,
    adjust: impl FnOnce(&mut Config),
) -> Result<PreparedFixture, ExitCode> {
    let fixture = Fixture::read(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::FAILURE
    })?;

    let mut config = ctx.config(config_args, fixture.request.clone())?;
    adjust(&mut config);

    let phase = FetchPhase::new(config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::FAILURE
    })?;

    let store = MemoryStore::new(phase.analyzer().clone(), fixture.mappings.clone());
    let loaded = fixture.load(store).map_err(|e| {
        eprintln!("error: {}: {e}", path.display());
        ExitCode::FAILURE
    })?;

    Ok(PreparedFixture {
        fixture,
        phase,
        loaded,
    })
}
