//! Rendering and JSON serialization for CLI output.

use std::{collections::BTreeMap, process::ExitCode};

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use glint_fetch::{DocRef, FetchError, HighlightField, HitHighlights};
use glint_highlight::HighlightOffsets;
use serde::Serialize;

/// ANSI escape sequences for terminal output.
mod colors {
    /// Resets all attributes.
    pub const RESET: &str = "\x1b[0m";
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Dimmed text.
    pub const DIM: &str = "\x1b[2m";
    /// Cyan foreground.
    pub const CYAN: &str = "\x1b[36m";
    /// Yellow foreground.
    pub const YELLOW: &str = "\x1b[33m";
}

/// Formats text as a section header (bold cyan).
pub fn header(text: &str) -> String {
    format!("{}{}{}{}", colors::BOLD, colors::CYAN, text, colors::RESET)
}

/// Formats text as a subheader (bold).
pub fn subheader(text: &str) -> String {
    format!("{}{}{}", colors::BOLD, text, colors::RESET)
}

/// Formats text as dimmed/less important.
pub fn dim(text: &str) -> String {
    format!("{}{}{}", colors::DIM, text, colors::RESET)
}

/// Formats text as a warning (yellow).
pub fn warning(text: &str) -> String {
    format!("{}{}{}", colors::YELLOW, text, colors::RESET)
}

/// A hit that could not be fetched.
#[derive(Serialize)]
struct JsonFailure {
    /// Hit document type.
    #[serde(rename = "type")]
    doc_type: String,
    /// Hit document id.
    id: String,
    /// Segment of the hit.
    segment: u32,
    /// Segment-local number of the hit.
    doc_id: u32,
    /// Rendered error.
    error: String,
}

/// JSON output of `glint highlight`.
#[derive(Serialize)]
struct JsonHighlightOutput<'a> {
    /// Results of the hits that succeeded, in page order.
    hits: Vec<&'a HitHighlights>,
    /// Hits that failed.
    failures: Vec<JsonFailure>,
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Outputs the fetch results of a page of hits.
///
/// Failed hits are reported and the others still printed; the exit code is a
/// failure when any hit failed.
pub fn output_highlights(
    hits: &[DocRef],
    results: &[Result<HitHighlights, FetchError>],
    json: bool,
) -> ExitCode {
    let failures: Vec<JsonFailure> = hits
        .iter()
        .zip(results)
        .filter_map(|(hit, result)| {
            result.as_ref().err().map(|e| JsonFailure {
                doc_type: hit.uid.doc_type.clone(),
                id: hit.uid.id.clone(),
                segment: hit.address.segment,
                doc_id: hit.address.doc_id,
                error: e.to_string(),
            })
        })
        .collect();
    let failed = !failures.is_empty();

    let code = if json {
        print_json(&JsonHighlightOutput {
            hits: results.iter().filter_map(|r| r.as_ref().ok()).collect(),
            failures,
        })
    } else {
        for (hit, result) in hits.iter().zip(results) {
            match result {
                Ok(highlights) => print_hit(highlights),
                Err(e) => eprintln!("error: {hit}: {e}"),
            }
        }
        ExitCode::SUCCESS
    };

    if failed { ExitCode::FAILURE } else { code }
}

/// Prints one hit: its fields, offsets and children.
fn print_hit(hit: &HitHighlights) {
    println!("{}", header(&format!("{}#{}", hit.doc_type, hit.id)));
    if hit.fields.is_empty() && hit.offsets.is_none() {
        println!("  {}", dim("(no highlights)"));
    }
    if !hit.fields.is_empty() {
        println!("{}", fields_table(&hit.fields));
    }
    if let Some(offsets) = &hit.offsets {
        println!("{}", offsets_table(offsets));
    }
    if let Some(children) = &hit.children {
        println!("{}", subheader(&format!("Children ({}):", children.len())));
        for child in children {
            println!("  {}#{}", child.doc_type, child.id);
            if !child.highlight_fields.is_empty() {
                println!("{}", fields_table(&child.highlight_fields));
            }
        }
    }
    println!();
}

/// Table of highlighted fields, one fragment per line.
fn fields_table(fields: &BTreeMap<String, HighlightField>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Field", "Fragments"]);
    for field in fields.values() {
        table.add_row(vec![
            Cell::new(&field.name),
            Cell::new(field.fragments.join("\n")),
        ]);
    }
    table
}

/// Table of match offsets per field.
fn offsets_table(offsets: &BTreeMap<String, Vec<HighlightOffsets>>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Field", "Offsets"]);
    for (field, ranges) in offsets {
        let rendered: Vec<String> = ranges
            .iter()
            .map(|o| format!("{}..{}", o.start, o.end))
            .collect();
        table.add_row(vec![Cell::new(field), Cell::new(rendered.join(" "))]);
    }
    table
}
