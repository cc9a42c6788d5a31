//! Configuration parsing.
//!
//! Parses `.glint.toml` files and request-level JSON into intermediate `RawConfig`
//! structures that preserve the optional nature of all fields before merging.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};

use crate::{ConfigError, Encoder, FragmentOrder, TagsSchema};

/// Raw configuration as parsed from a TOML file or a JSON request.
///
/// All fields are optional to support partial configs that will be merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here and ignore parent configs.
    pub root: Option<bool>,
    /// Highlight section.
    pub highlight: Option<RawHighlight>,
    /// Children section. Its presence enables the children phase.
    pub children: Option<RawChildren>,
    /// Fetch section.
    pub fetch: Option<RawFetch>,
}

/// Raw highlight options, shared by the global section and per-field overrides.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawHighlightOptions {
    /// Opening tag(s); a single string or an array.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub pre_tags: Option<Vec<String>>,
    /// Closing tag(s); a single string or an array.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub post_tags: Option<Vec<String>>,
    /// Named tag set, applied before explicit tags.
    pub tags_schema: Option<TagsSchema>,
    /// Encoder applied to fragment text.
    pub encoder: Option<Encoder>,
    /// Target fragment length in bytes.
    pub fragment_size: Option<usize>,
    /// Maximum fragments per field; 0 highlights whole values.
    pub number_of_fragments: Option<usize>,
    /// Fragment ordering.
    pub order: Option<FragmentOrder>,
    /// Margin before the first match of a fragment.
    pub fragment_offset: Option<usize>,
    /// Whether filter terms are highlighted.
    pub highlight_filter: Option<bool>,
    /// Whether only terms of the highlighted field are used.
    pub require_field_match: Option<bool>,
    /// Whether offsets are returned instead of fragment text.
    pub offsets_only: Option<bool>,
}

/// Raw `[highlight]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawHighlight {
    /// Defaults for every highlighted field.
    #[serde(flatten)]
    pub options: RawHighlightOptions,
    /// Fields to highlight, with their overrides.
    pub fields: Option<BTreeMap<String, RawHighlightOptions>>,
}

/// Raw `[children]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawChildren {
    /// Maximum children returned per hit.
    pub size: Option<usize>,
    /// Highlighting of the child documents.
    pub highlight: Option<RawHighlight>,
}

/// Raw `[fetch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFetch {
    /// Whether hits of a page are processed in parallel.
    pub parallel: Option<bool>,
    /// Ceiling on multi-term expansion.
    pub max_clause_count: Option<usize>,
    /// Stemming language of the highlight analyzer.
    pub stemmer: Option<String>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses request-level configuration from JSON.
pub fn parse_request_json(contents: &str) -> Result<RawConfig, ConfigError> {
    Ok(serde_json::from_str(contents)?)
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    parse_config_file(path).is_ok_and(|config| config.root == Some(true))
}
