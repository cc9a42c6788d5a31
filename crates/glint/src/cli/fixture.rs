//! JSON fixtures: an index, a query and the executor's child hits in one file.
//!
//! ```json
//! {
//!   "mappings": {"post": {"title": {}}, "comment": {"text": {"stored": true}}},
//!   "documents": [
//!     {"uid": {"type": "post", "id": "p1"}, "source": {"title": "Rust news"}},
//!     {"segment": 1, "uid": {"type": "comment", "id": "c1"},
//!      "fields": {"text": ["great rust"]}}
//!   ],
//!   "query": {"type": "relational", "child_type": "comment",
//!             "child_query": {"type": "term", "field": "text", "text": "rust"}},
//!   "hits": ["post#p1"],
//!   "children": [{"child_type": "comment", "parent": "post#p1", "children": ["comment#c1"]}],
//!   "request": {"children": {"size": 3}}
//! }
//! ```
//!
//! Documents are referenced by their `type#id` uid. `hits` defaults to every
//! document, in fixture order.

use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
};

use glint_config::RawConfig;
use glint_fetch::{DocRef, DocumentMappings, MemoryStore, SourceError, StoredDocument, Uid};
use glint_query::{ChildHit, ChildHitIndex, DocAddress, QueryNode, SegmentOrd};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Failed to read the fixture file.
    #[error("failed to read fixture {path}: {source}")]
    Read {
        /// Path of the fixture.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The fixture is not valid JSON of the expected shape.
    #[error("failed to parse fixture {path}: {source}")]
    Parse {
        /// Path of the fixture.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A hit or child reference is not a `type#id` uid.
    #[error(transparent)]
    Uid(#[from] SourceError),

    /// A hit or child reference names no document of the fixture.
    #[error("unknown document {0}")]
    UnknownDocument(Uid),

    /// Two documents share a uid.
    #[error("duplicate document {0}")]
    DuplicateDocument(Uid),
}

/// A document of the fixture and the segment it is indexed in.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDocument {
    /// Segment ordinal.
    #[serde(default)]
    pub segment: SegmentOrd,
    /// The document.
    #[serde(flatten)]
    pub document: StoredDocument,
}

/// Children an executor recorded for one parent under one relational clause.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureChildren {
    /// Child type of the relational clause.
    pub child_type: String,
    /// Uid of the parent.
    pub parent: String,
    /// Uids of the children, in executor order.
    pub children: Vec<String>,
}

/// A parsed fixture file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    /// Field mappings per document type.
    #[serde(default)]
    pub mappings: DocumentMappings,
    /// Documents to index.
    #[serde(default)]
    pub documents: Vec<FixtureDocument>,
    /// The query tree.
    pub query: QueryNode,
    /// Uids of the page of hits; every document when absent.
    #[serde(default)]
    pub hits: Option<Vec<String>>,
    /// Recorded child hits.
    #[serde(default)]
    pub children: Vec<FixtureChildren>,
    /// Request-level highlight configuration.
    #[serde(default)]
    pub request: Option<RawConfig>,
}

/// A fixture indexed into a [`MemoryStore`].
pub struct LoadedFixture {
    /// The indexed documents.
    pub store: MemoryStore,
    /// The page of hits, in page order.
    pub hits: Vec<DocRef>,
    /// Child hits per child type.
    pub child_hits: BTreeMap<String, ChildHitIndex>,
}

impl Fixture {
    /// Reads and parses a fixture file.
    pub fn read(path: &Path) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Indexes the documents into `store` and resolves hits and child hits.
    pub fn load(&self, mut store: MemoryStore) -> Result<LoadedFixture, FixtureError> {
        let mut addresses: HashMap<Uid, DocAddress> = HashMap::new();
        let mut order = Vec::with_capacity(self.documents.len());
        for doc in &self.documents {
            let uid = doc.document.uid.clone();
            if addresses.contains_key(&uid) {
                return Err(FixtureError::DuplicateDocument(uid));
            }
            let address = store.add_document(doc.segment, doc.document.clone());
            addresses.insert(uid.clone(), address);
            order.push(DocRef::new(address, uid));
        }

        let resolve = |reference: &str| -> Result<DocAddress, FixtureError> {
            let uid: Uid = reference.parse()?;
            addresses
                .get(&uid)
                .copied()
                .ok_or(FixtureError::UnknownDocument(uid))
        };

        let hits = match &self.hits {
            Some(hits) => hits
                .iter()
                .map(|reference| {
                    let address = resolve(reference)?;
                    Ok(DocRef::resolve(address, &store)?)
                })
                .collect::<Result<Vec<_>, FixtureError>>()?,
            None => order,
        };

        let mut child_hits: BTreeMap<String, ChildHitIndex> = BTreeMap::new();
        for entry in &self.children {
            let parent = resolve(&entry.parent)?;
            let index = child_hits.entry(entry.child_type.clone()).or_default();
            for child in &entry.children {
                let child = resolve(child)?;
                index.push(parent, ChildHit::new(child.segment, child.doc_id));
            }
        }

        debug!(
            documents = store.len(),
            hits = hits.len(),
            child_types = child_hits.len(),
            "loaded fixture"
        );
        Ok(LoadedFixture {
            store,
            hits,
            child_hits,
        })
    }
}

#[cfg(test)]
mod tests {
    use glint_highlight::build_analyzer_from_name;
    use serde_json::json;

    use super::*;

    /// Parses a fixture from a JSON value.
    fn parse(value: serde_json::Value) -> Fixture {
        serde_json::from_value(value).unwrap()
    }

    /// An empty store for the fixture's mappings.
    fn store(fixture: &Fixture) -> MemoryStore {
        MemoryStore::new(
            build_analyzer_from_name("english").unwrap(),
            fixture.mappings.clone(),
        )
    }

    /// Two posts and a comment on the first one.
    fn posts() -> serde_json::Value {
        json!({
            "mappings": {"post": {"title": {}}, "comment": {"text": {}}},
            "documents": [
                {"uid": {"type": "post", "id": "p1"}, "source": {"title": "Rust news"}},
                {"uid": {"type": "post", "id": "p2"}, "source": {"title": "Go news"}},
                {"segment": 2, "uid": {"type": "comment", "id": "c1"}, "source": {"text": "rust"}}
            ],
            "query": {"type": "term", "field": "title", "text": "news"},
            "children": [{"child_type": "comment", "parent": "post#p1", "children": ["comment#c1"]}]
        })
    }

    #[test]
    fn hits_default_to_every_document() {
        let fixture = parse(posts());
        let loaded = fixture.load(store(&fixture)).unwrap();
        let uids: Vec<String> = loaded.hits.iter().map(|h| h.uid.to_string()).collect();
        assert_eq!(uids, vec!["post#p1", "post#p2", "comment#c1"]);
        assert_eq!(loaded.hits[2].address, DocAddress::new(2, 0));

        let index = &loaded.child_hits["comment"];
        assert_eq!(index.get(DocAddress::new(0, 0)), &[ChildHit::new(2, 0)]);
    }

    #[test]
    fn hits_keep_page_order() {
        let mut value = posts();
        value["hits"] = json!(["post#p2", "post#p1"]);
        let fixture = parse(value);
        let loaded = fixture.load(store(&fixture)).unwrap();
        assert_eq!(loaded.hits[0].uid, Uid::new("post", "p2"));
        assert_eq!(loaded.hits[1].address, DocAddress::new(0, 0));
    }

    #[test]
    fn unknown_references_are_rejected() {
        let mut value = posts();
        value["hits"] = json!(["post#p9"]);
        let fixture = parse(value);
        assert!(matches!(
            fixture.load(store(&fixture)),
            Err(FixtureError::UnknownDocument(uid)) if uid == Uid::new("post", "p9")
        ));

        let mut value = posts();
        value["hits"] = json!(["no-separator"]);
        let fixture = parse(value);
        assert!(matches!(
            fixture.load(store(&fixture)),
            Err(FixtureError::Uid(SourceError::InvalidUid(_)))
        ));
    }

    #[test]
    fn duplicate_uids_are_rejected() {
        let mut value = posts();
        value["documents"][1]["uid"]["id"] = json!("p1");
        let fixture = parse(value);
        assert!(matches!(
            fixture.load(store(&fixture)),
            Err(FixtureError::DuplicateDocument(_))
        ));
    }
}
