//! Implementation of `glint terms`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use glint_fetch::DocumentSource;
use glint_query::{
    ExtractContext, ExtractedTerms, HighlightTerm, PhraseTerm, QueryNode, extract_terms,
    relational_clauses,
};
use serde::Serialize;

use super::shared::{PreparedFixture, prepare_fixture};
use crate::cli::{
    args::TermsCommand,
    context::CommandContext,
    output::{dim, print_json, subheader},
};

/// Extracted terms and phrases, sorted for display.
#[derive(Serialize)]
struct TermListing {
    /// Exact terms.
    terms: Vec<HighlightTerm>,
    /// Phrases.
    phrases: Vec<PhraseTerm>,
}

impl TermListing {
    /// Sorts extracted terms by field, then text.
    fn new(extracted: ExtractedTerms) -> Self {
        let mut terms: Vec<HighlightTerm> = extracted.terms.into_iter().collect();
        terms.sort_by(|a, b| (&a.field, &a.text).cmp(&(&b.field, &b.text)));
        let mut phrases: Vec<PhraseTerm> = extracted.phrases.into_iter().collect();
        phrases.sort_by(|a, b| (&a.field, &a.terms).cmp(&(&b.field, &b.terms)));
        Self { terms, phrases }
    }

    /// Table with one row per term or phrase.
    fn table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["Field", "Term", "Boost"]);
        for term in &self.terms {
            table.add_row(vec![
                Cell::new(&term.field),
                Cell::new(&term.text),
                Cell::new(format!("{:.2}", term.boost)),
            ]);
        }
        for phrase in &self.phrases {
            table.add_row(vec![
                Cell::new(&phrase.field),
                Cell::new(format!("\"{}\"", phrase.terms.join(" "))),
                Cell::new(format!("{:.2}", phrase.boost)),
            ]);
        }
        table
    }

    /// Returns true if nothing was extracted.
    fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }
}

/// Terms a relational clause highlights its children with.
#[derive(Serialize)]
struct ChildListing {
    /// Child document type.
    child_type: String,
    /// Terms of the child-side query.
    #[serde(flatten)]
    listing: TermListing,
}

/// JSON output of `glint terms`.
#[derive(Serialize)]
struct JsonTermsOutput<'a> {
    /// The query tree as parsed.
    query: &'a QueryNode,
    /// Terms the hits are highlighted with.
    #[serde(flatten)]
    listing: TermListing,
    /// Terms of every reachable relational clause.
    children: Vec<ChildListing>,
}

/// Prints a term listing or a placeholder when it is empty.
fn print_listing(listing: &TermListing) {
    if listing.is_empty() {
        println!("  {}", dim("(none)"));
    } else {
        println!("{}", listing.table());
    }
}

/// Shows the query tree and the terms extracted from it.
pub fn run(ctx: &CommandContext, cmd: &TermsCommand) -> ExitCode {
    let PreparedFixture {
        fixture,
        phase,
        loaded,
    } = match prepare_fixture(ctx, &cmd.fixture, &cmd.config, |_| {}) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };

    let mut extract = ExtractContext::new()
        .with_filters(cmd.filters)
        .with_max_clause_count(phase.config().fetch.max_clause_count);
    if let Some(rewriter) = loaded.store.rewriter(cmd.segment) {
        extract = extract.with_rewriter(rewriter);
    }

    let listing = TermListing::new(extract_terms(&fixture.query, &extract));
    let children: Vec<ChildListing> = relational_clauses(&fixture.query)
        .into_iter()
        .map(|clause| ChildListing {
            child_type: clause.child_type.clone(),
            listing: TermListing::new(extract_terms(&clause.child_query, &extract)),
        })
        .collect();

    if cmd.json {
        return print_json(&JsonTermsOutput {
            query: &fixture.query,
            listing,
            children,
        });
    }

    println!("{}", subheader("Query:"));
    match serde_json::to_string_pretty(&fixture.query) {
        Ok(json) => {
            for line in json.lines() {
                println!("  {line}");
            }
        }
        Err(e) => {
            eprintln!("error: failed to serialize query: {e}");
            return ExitCode::FAILURE;
        }
    }
    println!();

    println!("{}", subheader("Terms:"));
    print_listing(&listing);
    for child in &children {
        println!();
        println!(
            "{}",
            subheader(&format!("Children of type {}:", child.child_type))
        );
        print_listing(&child.listing);
    }
    ExitCode::SUCCESS
}
