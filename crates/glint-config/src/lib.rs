//! Configuration system for glint.
//!
//! Highlighting is configured at three levels, from lowest to highest precedence:
//! built-in defaults, `.glint.toml` files (found by walking up from the working
//! directory, nearest first, stopping at a file with `root = true`), and the
//! request itself (JSON with the same shape). Every level is parsed into the
//! all-optional `Raw*` structures and merged into a [`Config`].

#![warn(missing_docs)]

mod error;
mod merge;
mod parse;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawChildren, RawConfig, RawFetch, RawHighlight, RawHighlightOptions, is_root_config,
    parse_config_file, parse_config_str, parse_request_json,
};
use serde::{Deserialize, Serialize};
pub use validate::{ConfigWarning, MIN_FRAGMENT_SIZE};
use validate::validate_config;

/// The configuration filename.
pub const CONFIG_FILENAME: &str = ".glint.toml";

/// Number of tags in the `styled` tag schema.
const STYLED_TAG_COUNT: usize = 10;

/// Top-level merged configuration for glint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    /// Highlighting of the hits themselves.
    pub highlight: HighlightSettings,
    /// Children phase settings; `None` when no layer asked for children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<ChildrenSettings>,
    /// Fetch phase settings.
    pub fetch: FetchSettings,
}

impl Config {
    /// Loads configuration by discovering and merging `.glint.toml` files from `cwd`
    /// upwards.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        Self::load_from_files(&discover_config_files(cwd))
    }

    /// Loads configuration from config file paths, highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed = files
            .iter()
            .map(|path| {
                Ok(ParsedConfig {
                    source: path.display().to_string(),
                    config: parse_config_file(path)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(merge_configs(&parsed))
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings to TOML, in the `.glint.toml` format.
    pub fn settings_to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Discovers configuration files from `cwd` up to the filesystem root.
///
/// Returns paths nearest first. Discovery stops after a file with `root = true`.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let mut configs = Vec::new();
    for dir in cwd.ancestors() {
        let path = dir.join(CONFIG_FILENAME);
        if !path.is_file() {
            continue;
        }
        let is_root = is_root_config(&path);
        configs.push(path);
        if is_root {
            break;
        }
    }
    configs
}

/// How fragment text is escaped before tags are inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoder {
    /// Text is emitted as stored.
    #[default]
    #[serde(alias = "default")]
    None,
    /// Text is HTML-escaped.
    Html,
}

/// Order of the fragments of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentOrder {
    /// Document order.
    #[default]
    None,
    /// Descending score, ties in document order.
    Score,
}

/// Named tag sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagsSchema {
    /// Ten `<em class="hltN">` tags, one per distinct term.
    Styled,
}

impl TagsSchema {
    /// Returns the opening tags of the schema.
    pub fn pre_tags(self) -> Vec<String> {
        match self {
            Self::Styled => (1..=STYLED_TAG_COUNT)
                .map(|n| format!("<em class=\"hlt{n}\">"))
                .collect(),
        }
    }

    /// Returns the closing tags of the schema.
    pub fn post_tags(self) -> Vec<String> {
        match self {
            Self::Styled => vec![String::from("</em>")],
        }
    }
}

impl fmt::Display for TagsSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Styled => write!(f, "styled"),
        }
    }
}

/// Resolved highlight options for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightOptions {
    /// Opening tags, cycled per distinct term.
    pub pre_tags: Vec<String>,
    /// Closing tags, cycled per distinct term.
    pub post_tags: Vec<String>,
    /// Encoder applied to fragment text.
    pub encoder: Encoder,
    /// Target fragment length in bytes.
    pub fragment_size: usize,
    /// Maximum fragments; 0 highlights whole values.
    pub number_of_fragments: usize,
    /// Fragment ordering.
    pub order: FragmentOrder,
    /// Margin before the first match of a fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_offset: Option<usize>,
    /// Whether filter terms are highlighted.
    pub highlight_filter: bool,
    /// Whether only terms of the highlighted field are used.
    pub require_field_match: bool,
    /// Whether offsets are returned instead of fragment text.
    pub offsets_only: bool,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            pre_tags: vec![String::from("<em>")],
            post_tags: vec![String::from("</em>")],
            encoder: Encoder::None,
            fragment_size: 100,
            number_of_fragments: 5,
            order: FragmentOrder::None,
            fragment_offset: None,
            highlight_filter: false,
            require_field_match: false,
            offsets_only: false,
        }
    }
}

impl HighlightOptions {
    /// Overwrites every option present in `raw`.
    ///
    /// A tag schema is applied before explicit tags, so explicit tags win.
    pub fn apply(&mut self, raw: &RawHighlightOptions) {
        if let Some(schema) = raw.tags_schema {
            self.pre_tags = schema.pre_tags();
            self.post_tags = schema.post_tags();
        }
        if let Some(ref v) = raw.pre_tags {
            self.pre_tags.clone_from(v);
        }
        if let Some(ref v) = raw.post_tags {
            self.post_tags.clone_from(v);
        }
        if let Some(v) = raw.encoder {
            self.encoder = v;
        }
        if let Some(v) = raw.fragment_size {
            self.fragment_size = v;
        }
        if let Some(v) = raw.number_of_fragments {
            self.number_of_fragments = v;
        }
        if let Some(v) = raw.order {
            self.order = v;
        }
        if let Some(v) = raw.fragment_offset {
            self.fragment_offset = Some(v);
        }
        if let Some(v) = raw.highlight_filter {
            self.highlight_filter = v;
        }
        if let Some(v) = raw.require_field_match {
            self.require_field_match = v;
        }
        if let Some(v) = raw.offsets_only {
            self.offsets_only = v;
        }
    }
}

/// Highlight options resolved for a named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHighlightConfig {
    /// Field name.
    pub field: String,
    /// Resolved options.
    pub options: HighlightOptions,
}

/// Merged highlight settings: global defaults plus the fields to highlight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HighlightSettings {
    /// Options every field starts from.
    #[serde(flatten)]
    pub defaults: HighlightOptions,
    /// Resolved options per field to highlight.
    pub fields: BTreeMap<String, HighlightOptions>,
}

impl HighlightSettings {
    /// Returns the resolved configuration of every field to highlight, by name.
    pub fn field_configs(&self) -> Vec<FieldHighlightConfig> {
        self.fields
            .iter()
            .map(|(field, options)| FieldHighlightConfig {
                field: field.clone(),
                options: options.clone(),
            })
            .collect()
    }

    /// Returns true if no field is highlighted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Children phase settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildrenSettings {
    /// Maximum children returned per hit.
    pub size: usize,
    /// Highlighting of the child documents.
    pub highlight: HighlightSettings,
}

impl Default for ChildrenSettings {
    fn default() -> Self {
        Self {
            size: 10,
            highlight: HighlightSettings::default(),
        }
    }
}

/// Fetch phase settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Whether hits of a page are processed in parallel.
    pub parallel: bool,
    /// Ceiling on multi-term expansion.
    pub max_clause_count: usize,
    /// Stemming language of the highlight analyzer.
    pub stemmer: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            max_clause_count: 1024,
            stemmer: String::from("english"),
        }
    }
}
