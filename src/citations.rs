use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::SearchConfig;
use crate::types::Segment;

/// Inline citation markers: [^1] or [^2, ^3, ^10].
/// ASCII digits only; anything else inside the brackets is plain text.
static CITATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\^[0-9]+(?:,\s*\^[0-9]+)*)\]").unwrap());

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Split answer text into plain-text and citation segments, in source order.
pub fn parse_citations(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in CITATION_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let body = caps.get(1).unwrap().as_str();
        push_text(&mut segments, text, last, whole.start());
        segments.push(Segment::Citation {
            numbers: citation_numbers(body),
            raw_match: body.to_string(),
            key: format!("cite-{}", whole.start()),
        });
        last = whole.end();
    }
    push_text(&mut segments, text, last, text.len());
    segments
}

fn push_text(segments: &mut Vec<Segment>, text: &str, start: usize, end: usize) {
    if start < end {
        segments.push(Segment::Text {
            content: text[start..end].to_string(),
            key: format!("text-{start}"),
        });
    }
}

/// Every digit run in a marker body, in order. Oversized numbers saturate
/// so they resolve to the placeholder instead of vanishing.
fn citation_numbers(body: &str) -> Vec<usize> {
    DIGITS_RE
        .find_iter(body)
        .map(|m| m.as_str().parse().unwrap_or(usize::MAX))
        .collect()
}

/// Look up a 1-based reference number.
pub fn resolve_reference<'a>(references: &'a [String], number: usize, placeholder: &'a str) -> &'a str {
    number
        .checked_sub(1)
        .and_then(|idx| references.get(idx))
        .map(String::as_str)
        .unwrap_or(placeholder)
}

/// Build the search query for a clicked citation marker.
pub fn citation_query(numbers: &[usize], references: &[String], config: &SearchConfig) -> String {
    numbers
        .iter()
        .map(|&n| resolve_reference(references, n, &config.not_found_placeholder))
        .collect::<Vec<_>>()
        .join(&config.citation_separator)
}
