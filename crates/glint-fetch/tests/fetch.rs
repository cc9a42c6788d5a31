#![allow(clippy::tests_outside_test_module)]
//! End-to-end fetch phase runs over in-memory and Tantivy stores.

use std::collections::BTreeMap;

use glint_config::{ChildrenSettings, Config, HighlightOptions};
use glint_fetch::{
    DocRef, DocumentMappings, FetchPhase, FieldMapping, MemoryStore, StoredDocument, TantivyStore,
    Uid, schema_builder, text_field_options, wire,
};
use glint_highlight::{GLINT_TOKENIZER, build_analyzer_from_name};
use glint_query::{
    BooleanClause, ChildHit, ChildHitIndex, DocAddress, QueryNode, record_child_hits,
};
use serde_json::json;
use tantivy::{Index, doc};
use tempfile::TempDir;

/// Posts with a `title` and comments with a `text`, both read from `_source`.
fn mappings() -> DocumentMappings {
    DocumentMappings::new()
        .with("post", "title", FieldMapping::default())
        .with("comment", "text", FieldMapping::default())
}

/// A source-backed document.
fn document(doc_type: &str, id: &str, source: serde_json::Value) -> StoredDocument {
    StoredDocument {
        uid: Uid::new(doc_type, id),
        fields: BTreeMap::new(),
        source: Some(source),
    }
}

/// Highlights `title` on hits and `text` on children, keeping at most `size` children.
fn children_config(size: usize) -> Config {
    let mut config = Config::default();
    config
        .highlight
        .fields
        .insert(String::from("title"), HighlightOptions::default());
    let mut children = ChildrenSettings {
        size,
        ..ChildrenSettings::default()
    };
    children
        .highlight
        .fields
        .insert(String::from("text"), HighlightOptions::default());
    config.children = Some(children);
    config
}

#[test]
fn children_are_capped_in_executor_order() {
    let phase = FetchPhase::new(children_config(3)).unwrap();
    let mappings = mappings();
    let mut store = MemoryStore::new(phase.analyzer().clone(), mappings.clone());

    let parent = store.add_document(0, document("post", "p1", json!({"title": "Rust news"})));
    let mut children = Vec::new();
    for i in 0..5 {
        let segment = 1 + i % 2;
        let child = store.add_document(
            segment,
            document("comment", &format!("c{i}"), json!({"text": format!("reply {i} rust")})),
        );
        children.push(child);
    }

    let mut query = QueryNode::boolean(vec![
        BooleanClause::must(QueryNode::term("title", "news")),
        BooleanClause::must(QueryNode::relational(
            "comment",
            QueryNode::term("text", "rust"),
        )),
    ]);
    assert_eq!(phase.pre_process(&mut query), 1);

    // The executor reports children in its own order: c4, c0, c3, c1, c2.
    let index: ChildHitIndex = [4, 0, 3, 1, 2]
        .into_iter()
        .map(|i: usize| {
            let child = children[i];
            (parent, ChildHit::new(child.segment, child.doc_id))
        })
        .collect();
    record_child_hits(&mut query, "comment", &index);

    let hits = [DocRef::resolve(parent, &store).unwrap()];
    let results = phase.execute(&hits, &query, &store, &mappings);
    let hit = results[0].as_ref().unwrap();

    assert_eq!(hit.fields["title"].fragments, vec!["Rust <em>news</em>"]);
    let children = hit.children.as_ref().unwrap();
    let uids: Vec<_> = children
        .iter()
        .map(|c| (c.doc_type.as_str(), c.id.as_str()))
        .collect();
    assert_eq!(
        uids,
        vec![("comment", "c4"), ("comment", "c0"), ("comment", "c3")]
    );
    assert_eq!(
        children[0].highlight_fields["text"].fragments,
        vec!["reply 4 <em>rust</em>"]
    );

    let decoded: glint_fetch::HitHighlights = wire::decode(&wire::encode(hit)).unwrap();
    assert_eq!(&decoded, hit);
}

#[test]
fn parent_without_children_gets_an_empty_list() {
    let phase = FetchPhase::new(children_config(3)).unwrap();
    let mappings = mappings();
    let mut store = MemoryStore::new(phase.analyzer().clone(), mappings.clone());
    let parent = store.add_document(0, document("post", "p1", json!({"title": "Rust news"})));

    let mut query = QueryNode::relational("comment", QueryNode::term("text", "rust"));
    phase.pre_process(&mut query);

    let hits = [DocRef::resolve(parent, &store).unwrap()];
    let results = phase.execute(&hits, &query, &store, &mappings);
    let hit = results[0].as_ref().unwrap();
    assert!(hit.fields.is_empty());
    assert_eq!(hit.children.as_deref(), Some(&[][..]));
}

#[test]
fn multi_term_queries_expand_per_segment() {
    let mut config = Config::default();
    config
        .highlight
        .fields
        .insert(String::from("title"), HighlightOptions::default());
    let phase = FetchPhase::new(config).unwrap();
    let mappings = mappings();
    let mut store = MemoryStore::new(phase.analyzer().clone(), mappings.clone());

    let first = store.add_document(0, document("post", "a", json!({"title": "rustacean rust"})));
    let second = store.add_document(1, document("post", "b", json!({"title": "rustic rust"})));

    let query = QueryNode::prefix("title", "rust");
    let hits = [
        DocRef::resolve(first, &store).unwrap(),
        DocRef::resolve(second, &store).unwrap(),
    ];
    let results = phase.execute(&hits, &query, &store, &mappings);

    assert_eq!(
        results[0].as_ref().unwrap().fields["title"].fragments,
        vec!["<em>rustacean</em> <em>rust</em>"]
    );
    assert_eq!(
        results[1].as_ref().unwrap().fields["title"].fragments,
        vec!["<em>rustic</em> <em>rust</em>"]
    );
}

#[test]
fn too_broad_expansion_highlights_nothing() {
    let mut config = Config::default();
    config.fetch.max_clause_count = 1;
    config
        .highlight
        .fields
        .insert(String::from("title"), HighlightOptions::default());
    let phase = FetchPhase::new(config).unwrap();
    let mappings = mappings();
    let mut store = MemoryStore::new(phase.analyzer().clone(), mappings.clone());
    let address = store.add_document(0, document("post", "a", json!({"title": "rustic rust"})));

    let hits = [DocRef::resolve(address, &store).unwrap()];
    let query = QueryNode::boolean(vec![
        BooleanClause::should(QueryNode::prefix("title", "rust")),
        BooleanClause::should(QueryNode::term("title", "rustic")),
    ]);
    let results = phase.execute(&hits, &query, &store, &mappings);
    assert_eq!(
        results[0].as_ref().unwrap().fields["title"].fragments,
        vec!["<em>rustic</em> rust"]
    );
}

#[test]
fn tantivy_index_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut builder = schema_builder();
    let title = builder.add_text_field("title", text_field_options());
    let schema = builder.build();
    let uid = schema.get_field(glint_fetch::UID_FIELD).unwrap();

    let index = Index::create_in_dir(dir.path(), schema).unwrap();
    let analyzer = build_analyzer_from_name("english").unwrap();
    index.tokenizers().register(GLINT_TOKENIZER, analyzer.clone());
    let mut writer = index.writer_with_num_threads(1, 15_000_000).unwrap();
    writer
        .add_document(doc!(uid => "post#1", title => "Fuzzy matching in Rust"))
        .unwrap();
    writer.commit().unwrap();

    let store = TantivyStore::open(&index, analyzer).unwrap();
    let mappings = DocumentMappings::new().with(
        "post",
        "title",
        FieldMapping {
            stored: true,
            term_vectors: false,
        },
    );

    let mut config = Config::default();
    config
        .highlight
        .fields
        .insert(String::from("title"), HighlightOptions::default());
    let phase = FetchPhase::new(config).unwrap();

    let hits = [DocRef::resolve(DocAddress::new(0, 0), &store).unwrap()];
    assert_eq!(hits[0].uid, Uid::new("post", "1"));

    let query = QueryNode::fuzzy("title", "rusk", 1);
    let results = phase.execute(&hits, &query, &store, &mappings);
    assert_eq!(
        results[0].as_ref().unwrap().fields["title"].fragments,
        vec!["Fuzzy matching in <em>Rust</em>"]
    );
}
