//! Page-text extraction: flatten HTML to plain text, then split it into
//! line-delimited fragments worth storing.

use quest_core::SnippetRecord;
use std::collections::BTreeSet;
use std::io::Cursor;

/// Wide enough that html2text's wrapping rarely splits a sentence into
/// fragments below the usefulness threshold.
pub const TEXT_WIDTH: usize = 200;

/// Convert HTML to readable plain text.
///
/// Intentionally "good enough" and deterministic, not a readability engine.
pub fn html_to_text(html: &str, width: usize) -> String {
    // html2text expects bytes; Cursor avoids allocating a second large buffer.
    html2text::from_read(Cursor::new(html.as_bytes()), width).unwrap_or_else(|_| html.to_string())
}

/// Split flattened page text into trimmed, per-page-deduplicated fragments,
/// keeping only those above the usefulness threshold. First-seen order.
pub fn page_fragments(html: &str) -> Vec<String> {
    let text = html_to_text(html, TEXT_WIDTH);
    let mut seen = BTreeSet::<&str>::new();
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if !SnippetRecord::is_useful_fragment(line) {
            continue;
        }
        if !seen.insert(line) {
            continue;
        }
        out.push(line.to_string());
    }
    out
}
