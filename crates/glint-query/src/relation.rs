//! Lookup of relational (join) clauses inside a query tree.
//!
//! All walks here descend the same way: into the non-prohibited clauses of a boolean
//! query, the query side of a filtered query and the wrapped query of a
//! function-score node. A relational node is a leaf for these walks; a relational
//! clause nested inside another one's child query is not visited.

use tracing::trace;

use crate::{
    ast::{BooleanClause, QueryNode, RelationalQuery},
    children::{ChildHit, ChildHitIndex, DocAddress},
};

/// Calls `f` on every reachable relational clause, in tree order.
fn for_each_relational<'a>(node: &'a QueryNode, f: &mut impl FnMut(&'a RelationalQuery)) {
    match node {
        QueryNode::Boolean { clauses } => {
            for clause in clauses.iter().filter(|c| !c.is_prohibited()) {
                for_each_relational(&clause.query, f);
            }
        }
        QueryNode::Filtered { query, .. } | QueryNode::FunctionScore { query } => {
            for_each_relational(query, f);
        }
        QueryNode::Relational(rel) => f(rel),
        _ => {}
    }
}

/// Mutable counterpart of [`for_each_relational`].
fn for_each_relational_mut(node: &mut QueryNode, f: &mut impl FnMut(&mut RelationalQuery)) {
    match node {
        QueryNode::Boolean { clauses } => {
            for clause in clauses.iter_mut().filter(|c| !c.is_prohibited()) {
                for_each_relational_mut(&mut clause.query, f);
            }
        }
        QueryNode::Filtered { query, .. } | QueryNode::FunctionScore { query } => {
            for_each_relational_mut(query, f);
        }
        QueryNode::Relational(rel) => f(rel),
        _ => {}
    }
}

/// Enables child gathering, bounded to `max_children` per parent, on every reachable
/// relational clause. Returns the number of clauses enabled.
///
/// Must run before the query is scored.
pub fn enable_child_gathering(query: &mut QueryNode, max_children: usize) -> usize {
    let mut enabled = 0;
    for_each_relational_mut(query, &mut |rel| {
        rel.gather_children(max_children);
        enabled += 1;
    });
    trace!(enabled, max_children, "enabled child gathering");
    enabled
}

/// Returns the children recorded for `parent` by every reachable relational clause.
///
/// Hits of each clause keep the executor's order; clauses are concatenated in tree
/// order and the same child may appear more than once.
pub fn find_child_hits(query: &QueryNode, parent: DocAddress) -> Vec<ChildHit> {
    let mut hits = Vec::new();
    for_each_relational(query, &mut |rel| {
        hits.extend_from_slice(rel.child_hits_for(parent));
    });
    hits
}

/// Installs `index` on every reachable relational clause joining to `child_type`.
/// Returns the number of clauses that received it.
///
/// This is the executor's side of child gathering; clauses without gathering
/// enabled discard the index.
pub fn record_child_hits(
    query: &mut QueryNode,
    child_type: &str,
    index: &ChildHitIndex,
) -> usize {
    let mut recorded = 0;
    for_each_relational_mut(query, &mut |rel| {
        if rel.child_type == child_type {
            rel.record_child_hits(index.clone());
            recorded += 1;
        }
    });
    recorded
}

/// Returns every reachable relational clause, in tree order.
pub fn relational_clauses(query: &QueryNode) -> Vec<&RelationalQuery> {
    let mut clauses = Vec::new();
    for_each_relational(query, &mut |rel| clauses.push(rel));
    clauses
}

/// Returns the child-side predicate of every reachable relational clause.
pub fn child_queries(query: &QueryNode) -> Vec<&QueryNode> {
    relational_clauses(query)
        .into_iter()
        .map(|rel| rel.child_query.as_ref())
        .collect()
}

/// Combines every child-side predicate into one conjunction.
///
/// This is the query child documents are highlighted with. Returns `None` when the
/// tree has no reachable relational clause.
pub fn children_query(query: &QueryNode) -> Option<QueryNode> {
    let clauses: Vec<BooleanClause> = child_queries(query)
        .into_iter()
        .map(|child| BooleanClause::must(child.clone()))
        .collect();
    if clauses.is_empty() {
        None
    } else {
        Some(QueryNode::boolean(clauses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChildHitIndex, ExtractContext, Filter, extract_terms};

    /// Builds a child-hit index for one parent.
    fn hits_for(parent: DocAddress, docs: &[u32]) -> ChildHitIndex {
        docs.iter()
            .map(|doc| (parent, ChildHit::new(0, *doc)))
            .collect()
    }

    /// Records `index` on the n-th reachable relational clause.
    fn record(query: &mut QueryNode, nth: usize, index: ChildHitIndex) {
        let mut seen = 0;
        let mut index = Some(index);
        for_each_relational_mut(query, &mut |rel| {
            if seen == nth {
                if let Some(index) = index.take() {
                    rel.record_child_hits(index);
                }
            }
            seen += 1;
        });
    }

    /// Two reachable relational clauses and one prohibited one.
    fn two_clause_query() -> QueryNode {
        QueryNode::boolean(vec![
            BooleanClause::must(QueryNode::relational("comment", QueryNode::term("text", "a"))),
            BooleanClause::should(QueryNode::function_score(QueryNode::filtered(
                QueryNode::relational("review", QueryNode::term("text", "b")),
                Filter::term("tag", "x"),
            ))),
            BooleanClause::must_not(QueryNode::relational("spam", QueryNode::term("text", "c"))),
        ])
    }

    #[test]
    fn gathering_skips_prohibited_clauses() {
        let mut query = two_clause_query();
        assert_eq!(enable_child_gathering(&mut query, 3), 2);

        let clauses = relational_clauses(&query);
        assert_eq!(clauses.len(), 2);
        assert!(clauses.iter().all(|rel| rel.gather_limit() == Some(3)));
    }

    #[test]
    fn absent_parent_has_no_children() {
        let mut query = two_clause_query();
        enable_child_gathering(&mut query, 10);
        record(&mut query, 0, hits_for(DocAddress::new(0, 1), &[5, 6]));
        assert!(find_child_hits(&query, DocAddress::new(0, 2)).is_empty());
    }

    #[test]
    fn children_are_capped_and_ordered() {
        let parent = DocAddress::new(0, 1);
        let mut query = QueryNode::relational("comment", QueryNode::term("text", "a"));
        enable_child_gathering(&mut query, 3);
        record(&mut query, 0, hits_for(parent, &[9, 4, 7, 1, 2]));

        let found = find_child_hits(&query, parent);
        assert_eq!(
            found,
            vec![ChildHit::new(0, 9), ChildHit::new(0, 4), ChildHit::new(0, 7)]
        );
    }

    #[test]
    fn clauses_concatenate_in_tree_order() {
        let parent = DocAddress::new(1, 3);
        let mut query = two_clause_query();
        enable_child_gathering(&mut query, 10);
        record(&mut query, 0, hits_for(parent, &[1, 2]));
        record(&mut query, 1, hits_for(parent, &[2, 8]));

        let found = find_child_hits(&query, parent);
        assert_eq!(
            found,
            vec![
                ChildHit::new(0, 1),
                ChildHit::new(0, 2),
                ChildHit::new(0, 2),
                ChildHit::new(0, 8)
            ]
        );
    }

    #[test]
    fn recording_targets_clauses_by_child_type() {
        let parent = DocAddress::new(0, 1);
        let mut query = two_clause_query();
        enable_child_gathering(&mut query, 10);

        assert_eq!(
            record_child_hits(&mut query, "review", &hits_for(parent, &[4])),
            1
        );
        assert_eq!(
            record_child_hits(&mut query, "spam", &hits_for(parent, &[5])),
            0
        );
        assert_eq!(find_child_hits(&query, parent), vec![ChildHit::new(0, 4)]);
    }

    #[test]
    fn nested_relational_is_not_visited() {
        let mut query = QueryNode::relational(
            "comment",
            QueryNode::relational("reply", QueryNode::term("text", "a")),
        );
        assert_eq!(enable_child_gathering(&mut query, 2), 1);
        assert_eq!(relational_clauses(&query)[0].child_type, "comment");
    }

    #[test]
    fn children_query_conjoins_child_predicates() {
        let query = two_clause_query();
        let combined = children_query(&query).unwrap();
        let terms = extract_terms(&combined, &ExtractContext::default());
        assert!(terms.contains_term("text", "a"));
        assert!(terms.contains_term("text", "b"));
        assert!(!terms.contains_term("text", "c"));
    }

    #[test]
    fn no_relational_clause_means_no_children_query() {
        let query = QueryNode::term("title", "x");
        assert!(children_query(&query).is_none());
        assert!(child_queries(&query).is_empty());
    }
}
