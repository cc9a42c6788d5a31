//! Fetch-phase highlighting and parent/child aggregation for glint.
//!
//! After a query has been scored, the fetch phase turns each hit of the page into
//! its response payload: highlighted fragments (or match offsets) for the configured
//! fields, and for join queries, the child documents that made the hit match.
//!
//! The pieces:
//!
//! - [`DocumentSource`]: read access to stored values, `_source`, term vectors,
//!   `_uid` and per-segment term dictionaries. [`MemoryStore`] and [`TantivyStore`]
//!   implement it.
//! - [`DocumentMappings`]: which fields each document type maps, and how.
//! - [`ResultAggregator`]: builds the [`HitHighlights`] of one hit.
//! - [`FetchPhase`]: enables child gathering before scoring, then processes a page
//!   of hits in parallel.
//! - [`wire`]: the binary encoding of the results.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use glint_config::{Config, HighlightOptions};
//! use glint_fetch::{
//!     DocRef, DocumentMappings, FetchPhase, FieldMapping, MemoryStore, StoredDocument, Uid,
//! };
//! use glint_query::QueryNode;
//!
//! let mut config = Config::default();
//! config
//!     .highlight
//!     .fields
//!     .insert("body".into(), HighlightOptions::default());
//! let phase = FetchPhase::new(config).unwrap();
//!
//! let mappings = DocumentMappings::new().with("post", "body", FieldMapping::default());
//! let mut store = MemoryStore::new(phase.analyzer().clone(), mappings.clone());
//! let address = store.add_document(
//!     0,
//!     StoredDocument {
//!         uid: Uid::new("post", "1"),
//!         fields: BTreeMap::new(),
//!         source: Some(serde_json::json!({"body": "fetching rust docs"})),
//!     },
//! );
//!
//! let hits = [DocRef::resolve(address, &store).unwrap()];
//! let query = QueryNode::term("body", "rust");
//! let results = phase.execute(&hits, &query, &store, &mappings);
//! let hit = results[0].as_ref().unwrap();
//! assert_eq!(hit.fields["body"].fragments, ["fetching <em>rust</em> docs"]);
//! ```

#![warn(missing_docs)]

mod aggregate;
mod error;
mod expand;
mod hit;
mod mapping;
mod memory;
mod phase;
mod source;
mod tantivy_store;
pub mod wire;

pub use aggregate::{HitContext, ResultAggregator};
pub use error::{FetchError, SourceError, WireError};
pub use expand::{MAX_FUZZY_DISTANCE, literal_prefix, wildcard_matches};
pub use hit::{ChildrenResult, HighlightField, HitHighlights};
pub use mapping::{DocumentMappings, FieldMapping, MappingLookup};
pub use memory::{MemoryStore, StoredDocument};
pub use phase::FetchPhase;
pub use source::{DocRef, DocumentSource, Uid, source_values};
pub use tantivy_store::{SOURCE_FIELD, TantivyStore, UID_FIELD, schema_builder, text_field_options};
