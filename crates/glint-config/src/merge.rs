//! Configuration merging.
//!
//! Merges configuration layers into a single resolved [`Config`]. Layers are given
//! highest precedence first: the request, then the nearest config file, and so on.

use std::collections::BTreeMap;

use crate::{
    ChildrenSettings, Config, FetchSettings, HighlightOptions, HighlightSettings,
    parse::{RawConfig, RawFetch, RawHighlight, RawHighlightOptions},
};

/// A parsed configuration layer with a description of where it came from.
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    /// Origin of the layer (a file path, or `request`).
    pub source: String,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges configuration layers into a single resolved `Config`.
///
/// Merge rules:
/// - Scalar settings: the highest-precedence defined value wins
/// - Highlighted fields: the union of every layer's fields
/// - Per-field options: resolved from the merged defaults, then every layer's
///   overrides for that field, so a field override beats any global default
/// - Children: enabled as soon as one layer has a children section
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    // Lowest precedence first so higher precedence overwrites.
    let layers: Vec<&RawConfig> = configs.iter().rev().map(|p| &p.config).collect();

    let highlight = merge_highlight(layers.iter().filter_map(|c| c.highlight.as_ref()));
    let children = merge_children(&layers);
    let fetch = merge_fetch(layers.iter().filter_map(|c| c.fetch.as_ref()));

    Config {
        highlight,
        children,
        fetch,
    }
}

/// Merges highlight sections given lowest precedence first.
fn merge_highlight<'a>(layers: impl Iterator<Item = &'a RawHighlight>) -> HighlightSettings {
    let mut defaults = HighlightOptions::default();
    let mut overrides: BTreeMap<&str, Vec<&RawHighlightOptions>> = BTreeMap::new();

    for raw in layers {
        defaults.apply(&raw.options);
        for (name, field) in raw.fields.iter().flatten() {
            overrides.entry(name.as_str()).or_default().push(field);
        }
    }

    let fields = overrides
        .into_iter()
        .map(|(name, field_layers)| {
            let mut options = defaults.clone();
            for raw in field_layers {
                options.apply(raw);
            }
            (name.to_string(), options)
        })
        .collect();

    HighlightSettings { defaults, fields }
}

/// Merges children sections given lowest precedence first.
fn merge_children(layers: &[&RawConfig]) -> Option<ChildrenSettings> {
    let sections: Vec<_> = layers.iter().filter_map(|c| c.children.as_ref()).collect();
    if sections.is_empty() {
        return None;
    }

    let mut result = ChildrenSettings::default();
    for section in &sections {
        if let Some(size) = section.size {
            result.size = size;
        }
    }
    result.highlight = merge_highlight(sections.iter().filter_map(|s| s.highlight.as_ref()));
    Some(result)
}

/// Merges fetch sections given lowest precedence first.
fn merge_fetch<'a>(layers: impl Iterator<Item = &'a RawFetch>) -> FetchSettings {
    let mut result = FetchSettings::default();
    for raw in layers {
        if let Some(v) = raw.parallel {
            result.parallel = v;
        }
        if let Some(v) = raw.max_clause_count {
            result.max_clause_count = v;
        }
        if let Some(ref v) = raw.stemmer {
            result.stemmer.clone_from(v);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{Encoder, FragmentOrder, parse::parse_config_str, parse_request_json};

    /// Parses a TOML layer.
    fn layer(source: &str, toml: &str) -> ParsedConfig {
        ParsedConfig {
            source: source.to_string(),
            config: parse_config_str(toml, Path::new(source)).unwrap(),
        }
    }

    #[test]
    fn test_merge_empty_configs() {
        let config = merge_configs(&[]);
        assert_eq!(config, Config::default());
        assert!(config.highlight.is_empty());
        assert!(config.children.is_none());
    }

    #[test]
    fn test_merge_scalar_override() {
        let high = layer("high", "[highlight]\nfragment_size = 20\n[fetch]\nparallel = false\n");
        let low = layer(
            "low",
            "[highlight]\nfragment_size = 40\norder = \"score\"\n[fetch]\nmax_clause_count = 8\n",
        );
        let config = merge_configs(&[high, low]);

        assert_eq!(config.highlight.defaults.fragment_size, 20);
        assert_eq!(config.highlight.defaults.order, FragmentOrder::Score);
        assert!(!config.fetch.parallel);
        assert_eq!(config.fetch.max_clause_count, 8);
    }

    #[test]
    fn test_merge_field_union_and_overrides() {
        let high = layer("high", "[highlight.fields.title]\nencoder = \"html\"\n");
        let low = layer(
            "low",
            "[highlight]\nnumber_of_fragments = 3\n[highlight.fields.body]\nnumber_of_fragments = 0\n[highlight.fields.title]\nfragment_size = 30\n",
        );
        let config = merge_configs(&[high, low]);

        let fields = &config.highlight.fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["body"].number_of_fragments, 0);
        assert_eq!(fields["title"].number_of_fragments, 3);
        assert_eq!(fields["title"].fragment_size, 30);
        assert_eq!(fields["title"].encoder, Encoder::Html);
    }

    #[test]
    fn test_field_override_beats_higher_global_default() {
        let request = ParsedConfig {
            source: "request".into(),
            config: parse_request_json(r#"{"highlight": {"fragment_size": 80}}"#).unwrap(),
        };
        let file = layer("file", "[highlight.fields.body]\nfragment_size = 50\n");
        let config = merge_configs(&[request, file]);
        assert_eq!(config.highlight.defaults.fragment_size, 80);
        assert_eq!(config.highlight.fields["body"].fragment_size, 50);
    }

    #[test]
    fn test_merge_children() {
        let high = layer("high", "[children]\nsize = 3\n");
        let low = layer(
            "low",
            "[children.highlight]\npre_tags = \"<b>\"\n[children.highlight.fields.text]\n",
        );
        let children = merge_configs(&[high, low]).children.unwrap();
        assert_eq!(children.size, 3);
        assert_eq!(children.highlight.fields["text"].pre_tags, vec!["<b>"]);
    }

    #[test]
    fn test_children_section_without_size_uses_default() {
        let children = merge_configs(&[layer("file", "[children]\n")]).children.unwrap();
        assert_eq!(children.size, 10);
        assert!(children.highlight.is_empty());
    }
}
