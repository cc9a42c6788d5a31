//! Error types for the glint-highlight crate.

use thiserror::Error;

/// Errors that can occur while preparing a highlighter.
#[derive(Debug, Error)]
pub enum HighlightError {
    /// Invalid stemmer language.
    #[error("unsupported stemmer language: {0}")]
    InvalidLanguage(String),
}
