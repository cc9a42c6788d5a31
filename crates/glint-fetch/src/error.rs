//! Error types for the glint-fetch crate.

use std::string::FromUtf8Error;

use glint_highlight::HighlightError;
use glint_query::DocAddress;
use thiserror::Error;

/// Errors raised by a document source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No document exists at the address.
    #[error("no document at segment {} doc {}", .0.segment, .0.doc_id)]
    MissingDocument(DocAddress),

    /// The document has no stored `_uid`.
    #[error("document at segment {} doc {} has no _uid", .0.segment, .0.doc_id)]
    MissingUid(DocAddress),

    /// A stored `_uid` is not of the form `type#id`.
    #[error("malformed _uid '{0}'")]
    InvalidUid(String),

    /// The field is not part of the index schema.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The stored `_source` is not valid JSON.
    #[error("invalid _source document: {0}")]
    InvalidSource(#[from] serde_json::Error),

    /// Failed to open the index.
    #[error("failed to open index: {0}")]
    Open(String),

    /// Failed to read a stored document.
    #[error("failed to read document: {0}")]
    Read(String),
}

impl SourceError {
    /// Creates an `Open` error from a Tantivy error.
    pub(crate) fn open(source: &tantivy::TantivyError) -> Self {
        Self::Open(source.to_string())
    }

    /// Creates a `Read` error from a Tantivy error.
    pub(crate) fn read(source: &tantivy::TantivyError) -> Self {
        Self::Read(source.to_string())
    }
}

/// Errors that fail the fetch of a single hit.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A highlighted field could not be read.
    #[error("failed to highlight field [{field}] of {doc}")]
    Highlight {
        /// Field being highlighted.
        field: String,
        /// Document being highlighted.
        doc: String,
        /// Underlying failure.
        #[source]
        source: SourceError,
    },

    /// A child document could not be loaded.
    #[error("failed to fetch child doc id [{doc_id}] in segment {segment}")]
    ChildDocument {
        /// Segment of the child.
        segment: u32,
        /// Segment-local number of the child.
        doc_id: u32,
        /// Underlying failure.
        #[source]
        source: SourceError,
    },

    /// The highlight analyzer could not be built.
    #[error(transparent)]
    Analyzer(#[from] HighlightError),
}

impl FetchError {
    /// Creates a `Highlight` error.
    pub(crate) fn highlight(field: &str, doc: impl ToString, source: SourceError) -> Self {
        Self::Highlight {
            field: field.to_string(),
            doc: doc.to_string(),
            source,
        }
    }

    /// Creates a `ChildDocument` error.
    pub(crate) fn child_document(address: DocAddress, source: SourceError) -> Self {
        Self::ChildDocument {
            segment: address.segment,
            doc_id: address.doc_id,
            source,
        }
    }
}

/// Errors raised while decoding the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The input ended in the middle of a value.
    #[error("unexpected end of input at byte {0}")]
    Truncated(usize),

    /// A variable-length integer does not fit in 64 bits.
    #[error("variable-length integer overflow at byte {0}")]
    VarintOverflow(usize),

    /// A length or count does not fit in memory on this platform.
    #[error("length {0} is too large")]
    LengthTooLarge(u64),

    /// A string is not valid UTF-8.
    #[error("invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// A presence flag is neither 0 nor 1.
    #[error("invalid flag byte {0}")]
    InvalidFlag(u8),

    /// Bytes remain after the value was decoded.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}
