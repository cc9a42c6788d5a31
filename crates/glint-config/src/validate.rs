//! Configuration validation.
//!
//! Validates a merged configuration and reports warnings for settings that will
//! be adjusted or ignored at fetch time.

use std::fmt;

use crate::{Config, HighlightOptions, HighlightSettings};

/// Smallest fragment size the position-based fragmenter accepts; smaller sizes are
/// raised to it.
pub const MIN_FRAGMENT_SIZE: usize = 18;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Neither the hits nor the children have fields to highlight.
    NoFieldsToHighlight,
    /// A field has no opening or no closing tag.
    EmptyTags {
        /// Configuration path of the field.
        scope: String,
    },
    /// A field's fragment size is below the fragmenter minimum.
    FragmentSizeTooSmall {
        /// Configuration path of the field.
        scope: String,
        /// Configured size.
        size: usize,
    },
    /// A field's fragment offset does not fit in its fragment size.
    FragmentOffsetTooLarge {
        /// Configuration path of the field.
        scope: String,
        /// Configured offset.
        offset: usize,
        /// Configured fragment size.
        size: usize,
    },
    /// The children section returns no children.
    ChildrenSizeZero,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFieldsToHighlight => write!(f, "no fields are configured for highlighting"),
            Self::EmptyTags { scope } => {
                write!(f, "{scope}: pre_tags and post_tags must not be empty")
            }
            Self::FragmentSizeTooSmall { scope, size } => write!(
                f,
                "{scope}: fragment_size {size} is below the minimum of {MIN_FRAGMENT_SIZE}"
            ),
            Self::FragmentOffsetTooLarge {
                scope,
                offset,
                size,
            } => write!(
                f,
                "{scope}: fragment_offset {offset} is not smaller than fragment_size {size}"
            ),
            Self::ChildrenSizeZero => write!(f, "children.size is 0, no children will be returned"),
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    let children_fields = config
        .children
        .as_ref()
        .is_some_and(|children| !children.highlight.is_empty());
    if config.highlight.is_empty() && !children_fields {
        warnings.push(ConfigWarning::NoFieldsToHighlight);
    }

    validate_highlight("highlight", &config.highlight, &mut warnings);

    if let Some(children) = &config.children {
        if children.size == 0 {
            warnings.push(ConfigWarning::ChildrenSizeZero);
        }
        validate_highlight("children.highlight", &children.highlight, &mut warnings);
    }

    warnings
}

/// Validates every field of a highlight section.
fn validate_highlight(prefix: &str, settings: &HighlightSettings, out: &mut Vec<ConfigWarning>) {
    for (field, options) in &settings.fields {
        validate_options(format!("{prefix}.fields.{field}"), options, out);
    }
}

/// Validates the resolved options of one field.
fn validate_options(scope: String, options: &HighlightOptions, out: &mut Vec<ConfigWarning>) {
    if options.pre_tags.is_empty() || options.post_tags.is_empty() {
        out.push(ConfigWarning::EmptyTags {
            scope: scope.clone(),
        });
    }
    // Whole-value highlighting ignores the fragment geometry.
    if options.number_of_fragments == 0 || options.offsets_only {
        return;
    }
    if options.fragment_size < MIN_FRAGMENT_SIZE {
        out.push(ConfigWarning::FragmentSizeTooSmall {
            scope: scope.clone(),
            size: options.fragment_size,
        });
    }
    if let Some(offset) = options.fragment_offset
        && offset >= options.fragment_size
    {
        out.push(ConfigWarning::FragmentOffsetTooLarge {
            scope,
            offset,
            size: options.fragment_size,
        });
    }
}
