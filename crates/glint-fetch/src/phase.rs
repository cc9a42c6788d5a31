//! The fetch phase driver.
//!
//! A request runs the phase in two steps. [`FetchPhase::pre_process`] runs once
//! before the query is scored and turns on child gathering. [`FetchPhase::execute`]
//! runs after scoring over the page of hits, one worker per hit.

use glint_config::Config;
use glint_highlight::build_analyzer_from_name;
use glint_query::{QueryNode, enable_child_gathering};
use rayon::prelude::*;
use tantivy::tokenizer::TextAnalyzer;
use tracing::debug;

use crate::{
    DocRef, DocumentMappings, DocumentSource, FetchError, HitContext, HitHighlights,
    ResultAggregator,
};

/// Highlights and children for a page of hits.
#[derive(Clone)]
pub struct FetchPhase {
    /// Merged configuration of the request.
    config: Config,
    /// Analyzer used to re-tokenize stored values.
    analyzer: TextAnalyzer,
    /// Per-hit result builder.
    aggregator: ResultAggregator,
}

impl FetchPhase {
    /// Creates the phase for a request configuration.
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let analyzer = build_analyzer_from_name(&config.fetch.stemmer)?;
        let aggregator = ResultAggregator::new(&config);
        Ok(Self {
            config,
            analyzer,
            aggregator,
        })
    }

    /// Returns the configuration the phase runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the highlight analyzer.
    pub fn analyzer(&self) -> &TextAnalyzer {
        &self.analyzer
    }

    /// Prepares the query for scoring: when children are requested, every reachable
    /// relational clause gathers up to the children size per parent.
    ///
    /// Returns the number of clauses that will gather children.
    pub fn pre_process(&self, query: &mut QueryNode) -> usize {
        match &self.config.children {
            Some(children) => enable_child_gathering(query, children.size),
            None => 0,
        }
    }

    /// Processes a page of hits.
    ///
    /// Results are in page order. A failed hit does not affect the others.
    pub fn execute(
        &self,
        hits: &[DocRef],
        query: &QueryNode,
        source: &dyn DocumentSource,
        mappings: &DocumentMappings,
    ) -> Vec<Result<HitHighlights, FetchError>> {
        let ctx = HitContext {
            source,
            mappings,
            query,
            analyzer: &self.analyzer,
            max_clause_count: self.config.fetch.max_clause_count,
        };

        debug!(
            hits = hits.len(),
            parallel = self.config.fetch.parallel,
            "executing fetch phase"
        );
        if self.config.fetch.parallel {
            hits.par_iter()
                .map(|hit| self.aggregator.aggregate_hit(hit, &ctx))
                .collect()
        } else {
            hits.iter()
                .map(|hit| self.aggregator.aggregate_hit(hit, &ctx))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use glint_config::{ChildrenSettings, HighlightOptions};
    use glint_query::{DocAddress, relational_clauses};
    use serde_json::json;

    use super::*;
    use crate::{FieldMapping, MemoryStore, StoredDocument, Uid};

    /// A config highlighting `body`, optionally sequential.
    fn config(parallel: bool) -> Config {
        let mut config = Config::default();
        config.fetch.parallel = parallel;
        config
            .highlight
            .fields
            .insert(String::from("body"), HighlightOptions::default());
        config
    }

    #[test]
    fn invalid_stemmer_is_rejected() {
        let mut config = Config::default();
        config.fetch.stemmer = String::from("klingon");
        assert!(matches!(
            FetchPhase::new(config),
            Err(FetchError::Analyzer(_))
        ));
    }

    #[test]
    fn pre_process_only_with_children() {
        let query = QueryNode::relational("comment", QueryNode::term("text", "a"));

        let mut plain = query.clone();
        let phase = FetchPhase::new(Config::default()).unwrap();
        assert_eq!(phase.pre_process(&mut plain), 0);
        assert_eq!(relational_clauses(&plain)[0].gather_limit(), None);

        let mut config = Config::default();
        config.children = Some(ChildrenSettings {
            size: 3,
            ..ChildrenSettings::default()
        });
        let mut gathering = query;
        let phase = FetchPhase::new(config).unwrap();
        assert_eq!(phase.pre_process(&mut gathering), 1);
        assert_eq!(relational_clauses(&gathering)[0].gather_limit(), Some(3));
    }

    #[test]
    fn page_order_is_kept_and_failures_are_per_hit() {
        let mappings =
            DocumentMappings::new().with("post", "body", FieldMapping::default());
        let analyzer = build_analyzer_from_name("english").unwrap();
        let mut store = MemoryStore::new(analyzer, mappings.clone());

        let mut hits = Vec::new();
        for i in 0..20 {
            let address = store.add_document(
                i % 3,
                StoredDocument {
                    uid: Uid::new("post", i.to_string()),
                    fields: BTreeMap::new(),
                    source: Some(json!({"body": format!("post {i} about rust")})),
                },
            );
            hits.push(DocRef::resolve(address, &store).unwrap());
        }
        hits.insert(5, DocRef::new(DocAddress::new(9, 9), Uid::new("post", "gone")));

        let query = QueryNode::term("body", "rust");
        for parallel in [true, false] {
            let phase = FetchPhase::new(config(parallel)).unwrap();
            let results = phase.execute(&hits, &query, &store, &mappings);
            assert_eq!(results.len(), 21);

            for (hit, result) in hits.iter().zip(&results) {
                if hit.uid.id == "gone" {
                    assert!(matches!(result, Err(FetchError::Highlight { .. })));
                    continue;
                }
                let result = result.as_ref().unwrap();
                assert_eq!(result.id, hit.uid.id);
                assert_eq!(
                    result.fields["body"].fragments,
                    vec![format!("post {} about <em>rust</em>", hit.uid.id)]
                );
            }
        }
    }
}
