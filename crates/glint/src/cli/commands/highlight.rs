//! Implementation of `glint highlight`.

use std::process::ExitCode;

use glint_config::Config;
use glint_query::record_child_hits;
use tracing::warn;

use super::shared::{PreparedFixture, prepare_fixture};
use crate::cli::{args::HighlightCommand, context::CommandContext, output::output_highlights};

/// Switches every hit field to offsets-only mode.
fn force_offsets(config: &mut Config) {
    config.highlight.defaults.offsets_only = true;
    for options in config.highlight.fields.values_mut() {
        options.offsets_only = true;
    }
}

/// Runs the fetch phase over a fixture and prints the result of every hit.
pub fn run(ctx: &CommandContext, cmd: &HighlightCommand) -> ExitCode {
    let adjust = |config: &mut Config| {
        if cmd.offsets {
            force_offsets(config);
        }
    };
    let PreparedFixture {
        fixture,
        phase,
        loaded,
    } = match prepare_fixture(ctx, &cmd.fixture, &cmd.config, adjust) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };

    let mut query = fixture.query;
    phase.pre_process(&mut query);
    for (child_type, index) in &loaded.child_hits {
        if record_child_hits(&mut query, child_type, index) == 0 {
            warn!(
                child_type = child_type.as_str(),
                "child hits recorded for a type no gathering clause joins"
            );
        }
    }

    let results = phase.execute(&loaded.hits, &query, &loaded.store, &fixture.mappings);
    output_highlights(&loaded.hits, &results, cmd.json)
}

#[cfg(test)]
mod tests {
    use glint_config::HighlightOptions;

    use super::*;

    #[test]
    fn offsets_mode_covers_defaults_and_fields() {
        let mut config = Config::default();
        config
            .highlight
            .fields
            .insert(String::from("title"), HighlightOptions::default());
        force_offsets(&mut config);
        assert!(config.highlight.defaults.offsets_only);
        assert!(config.highlight.fields["title"].offsets_only);
    }
}
