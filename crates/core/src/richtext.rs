//! Shape text serialization for board cells.
//!
//! Cells keep hyperlinks alive: link-bearing runs are written as
//! spreadsheet HYPERLINK formulas so exported rows still render as links,
//! while plain runs pass through verbatim. Segments are newline-joined in
//! run order.

use crate::types::{TextRun, EMPTY_CELL};

/// Serialize a shape's runs into a single board cell.
///
/// `full_text` is the shape's paragraph-joined plain text; it decides the
/// empty case and backstops run models that yield nothing usable.
pub fn cell_text(runs: &[TextRun], full_text: &str) -> String {
    let full = full_text.trim();
    if full.is_empty() {
        return EMPTY_CELL.to_string();
    }

    let mut segments: Vec<String> = Vec::new();
    for run in runs {
        let text = run.text.trim();
        if text.is_empty() {
            continue;
        }

        match run.hyperlink.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => segments.push(hyperlink_formula(url, text)),
            _ => segments.push(text.to_string()),
        }
    }

    // Some decks report text the run walk misses (empty runs around a
    // field, for instance). Fall back to the shape's own text.
    if segments.is_empty() {
        return full.to_string();
    }

    segments.join("\n")
}

/// Spreadsheet hyperlink formula for one link-bearing run.
///
/// Double quotes inside the display text are doubled, the formula-escape
/// convention.
fn hyperlink_formula(url: &str, text: &str) -> String {
    format!("=HYPERLINK(\"{}\",\"{}\")", url, text.replace('"', "\"\""))
}
