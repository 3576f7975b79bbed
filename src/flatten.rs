use crate::types::{PageTextLayer, TextNode};

/// Inserted between consecutive nodes of the flattened text.
pub const NODE_SEPARATOR: char = ' ';

/// A page's searchable nodes joined into one logical string.
///
/// Offsets are in `char`s. Node `i` occupies `[start_i, start_i + len_i + 1)`,
/// the extra slot being the separator that follows it.
#[derive(Debug)]
pub struct FlatPage<'a> {
    pub page_index: usize,
    pub nodes: Vec<&'a TextNode>,
    pub chars: Vec<char>,
}

impl<'a> FlatPage<'a> {
    /// Keeps nodes with visible text, skipping decorative containers.
    pub fn build(page_index: usize, layer: &'a PageTextLayer) -> Self {
        let nodes: Vec<&TextNode> = layer
            .nodes
            .iter()
            .filter(|n| !n.is_decorative() && !n.text.trim().is_empty())
            .collect();

        let mut chars = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                chars.push(NODE_SEPARATOR);
            }
            chars.extend(node.text.chars());
        }
        Self { page_index, nodes, chars }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Each node with its `[start, end)` interval, separator included.
    pub fn spans(&self) -> impl Iterator<Item = (&'a TextNode, usize, usize)> + '_ {
        let mut position = 0;
        self.nodes.iter().map(move |node| {
            let start = position;
            position += node.char_len() + 1;
            (*node, start, position)
        })
    }

    /// Nodes touched by `[start, end)`: the match starts inside the node,
    /// ends inside it, or spans it entirely.
    pub fn nodes_covering(&self, start: usize, end: usize) -> Vec<TextNode> {
        self.spans()
            .filter(|&(_, node_start, node_end)| {
                (start >= node_start && start < node_end)
                    || (end > node_start && end <= node_end)
                    || (start <= node_start && end >= node_end)
            })
            .map(|(node, _, _)| node.clone())
            .collect()
    }

    /// Nodes whose interval intersects `[start, end)` at all.
    pub fn nodes_intersecting(&self, start: usize, end: usize) -> Vec<TextNode> {
        let mut out = Vec::new();
        for (node, node_start, node_end) in self.spans() {
            if start < node_end && end > node_start {
                out.push(node.clone());
            }
            if node_start > end {
                break;
            }
        }
        out
    }
}

/// Lowercase a single char without changing the char count.
pub fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

pub fn fold_chars(s: &str) -> Vec<char> {
    s.chars().map(fold_char).collect()
}

fn is_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '\u{2018}' | '\u{2019}' | '\u{201c}' | '\u{201d}')
}

fn is_folded_punct(c: char) -> bool {
    matches!(
        c,
        ',' | '/' | '#' | '!' | '$' | '%' | '^' | '&' | '*' | ';' | ':' | '{' | '}' | '='
            | '-' | '_' | '`' | '~' | '(' | ')' | '\\' | '[' | ']'
    )
}

/// Position tables between a normalized string and the text it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterMapping {
    /// Strictly increasing.
    pub prepared_to_original: Vec<usize>,
    /// `None` for characters dropped by normalization.
    pub original_to_prepared: Vec<Option<usize>>,
}

impl CharacterMapping {
    /// Original index for a prepared position; positions at or past the end
    /// clamp to the last mapped character.
    pub fn to_original(&self, prepared: usize) -> usize {
        self.prepared_to_original
            .get(prepared)
            .or_else(|| self.prepared_to_original.last())
            .copied()
            .unwrap_or(0)
    }

    /// Original exclusive end for a prepared exclusive end; ends at or past
    /// the last prepared char land one past its original index.
    pub fn to_original_end(&self, prepared_end: usize) -> usize {
        match self.prepared_to_original.get(prepared_end) {
            Some(&idx) => idx,
            None => self.prepared_to_original.last().map_or(0, |&idx| idx + 1),
        }
    }

    pub fn to_prepared(&self, original: usize) -> Option<usize> {
        self.original_to_prepared.get(original).copied().flatten()
    }
}

/// Normalized text and its mapping back to the input.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub chars: Vec<char>,
    pub mapping: CharacterMapping,
}

impl Normalized {
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }
}

/// Fold text for fuzzy comparison: quotes vanish, punctuation and
/// whitespace runs become one space, letters lowercase, ends trimmed.
pub fn normalize(original: &[char]) -> Normalized {
    let mut chars = Vec::with_capacity(original.len());
    let mut prepared_to_original = Vec::with_capacity(original.len());
    let mut original_to_prepared = vec![None; original.len()];
    let mut last_was_space = true;

    for (idx, &c) in original.iter().enumerate() {
        if is_quote(c) {
            continue;
        }
        let out = if is_folded_punct(c) || c.is_whitespace() { ' ' } else { fold_char(c) };
        if out == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }
        original_to_prepared[idx] = Some(chars.len());
        prepared_to_original.push(idx);
        chars.push(out);
    }

    if chars.last() == Some(&' ') {
        chars.pop();
        if let Some(idx) = prepared_to_original.pop() {
            original_to_prepared[idx] = None;
        }
    }

    Normalized {
        chars,
        mapping: CharacterMapping { prepared_to_original, original_to_prepared },
    }
}

pub fn normalize_str(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    normalize(&chars).text()
}

/// First occurrence of `needle` in `haystack` at or after `from`.
pub fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{RenderedDocument, TextLayerSource};
    use crate::types::NodeKind;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn flattening_joins_with_single_separator() {
        let doc = RenderedDocument::from_pages([vec!["the quick", "brown", "fox"]]);
        let flat = FlatPage::build(0, &doc.text_layers()[0]);
        assert_eq!(flat.text(), "the quick brown fox");
        let spans: Vec<_> = flat.spans().map(|(n, s, e)| (n.text.as_str(), s, e)).collect();
        assert_eq!(spans, vec![("the quick", 0, 10), ("brown", 10, 16), ("fox", 16, 20)]);
    }

    #[test]
    fn blank_and_decorative_nodes_are_skipped() {
        let mut doc = RenderedDocument::new();
        let p = doc.push_page();
        doc.push_node(p, "alpha beta", NodeKind::MarkedContent);
        doc.push_node(p, "alpha", NodeKind::Text);
        doc.push_node(p, "   ", NodeKind::Text);
        doc.push_node(p, "beta", NodeKind::Text);
        let flat = FlatPage::build(0, &doc.text_layers()[0]);
        assert_eq!(flat.text(), "alpha beta");
        assert_eq!(flat.nodes.len(), 2);
    }

    #[test]
    fn covering_includes_boundary_nodes() {
        let doc = RenderedDocument::from_pages([vec!["ab", "cd", "ef"]]);
        let flat = FlatPage::build(0, &doc.text_layers()[0]);
        // "b cd" spans nodes 0..2; "cd" alone touches only node 1
        let texts = |v: Vec<TextNode>| v.into_iter().map(|n| n.text).collect::<Vec<_>>();
        assert_eq!(texts(flat.nodes_covering(1, 5)), vec!["ab", "cd"]);
        assert_eq!(texts(flat.nodes_covering(3, 5)), vec!["cd"]);
        assert_eq!(texts(flat.nodes_covering(0, 8)), vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn intersecting_stops_after_window() {
        let doc = RenderedDocument::from_pages([vec!["ab", "cd", "ef", "gh"]]);
        let flat = FlatPage::build(0, &doc.text_layers()[0]);
        let hits: Vec<_> = flat.nodes_intersecting(2, 4).into_iter().map(|n| n.text).collect();
        assert_eq!(hits, vec!["ab", "cd"]);
    }

    #[test]
    fn normalization_folds_punctuation_case_and_space() {
        assert_eq!(normalize_str("  Hello,   World! "), "hello world");
        assert_eq!(normalize_str("don't \u{201c}quote\u{201d}"), "dont quote");
        assert_eq!(normalize_str("a-b_c(d)[e]{f}"), "a b c d e f");
        assert_eq!(normalize_str("price: $5"), "price 5");
        assert_eq!(normalize_str(""), "");
        assert_eq!(normalize_str(" ,;: "), "");
    }

    #[test]
    fn mapping_points_back_to_source() {
        let src = chars("Ab, 'c'd.");
        let n = normalize(&src);
        assert_eq!(n.text(), "ab cd.");
        assert_eq!(n.mapping.prepared_to_original, vec![0, 1, 2, 5, 7, 8]);
        assert_eq!(n.mapping.to_prepared(3), None);
        assert_eq!(n.mapping.to_prepared(4), None);
        assert_eq!(n.mapping.to_prepared(5), Some(3));
        assert_eq!(n.mapping.to_original(99), 8);
        assert_eq!(n.mapping.to_original_end(3), 5);
        assert_eq!(n.mapping.to_original_end(6), 9);
        assert_eq!(CharacterMapping::default().to_original_end(0), 0);
        assert!(n.mapping.prepared_to_original.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn trailing_folded_punctuation_is_trimmed_from_mapping() {
        let n = normalize(&chars("foo,"));
        assert_eq!(n.text(), "foo");
        assert_eq!(n.mapping.prepared_to_original.len(), 3);
        assert_eq!(n.mapping.to_prepared(3), None);
    }

    #[test]
    fn find_from_scans_forward() {
        let hay = chars("aaa");
        let needle = chars("aa");
        assert_eq!(find_from(&hay, &needle, 0), Some(0));
        assert_eq!(find_from(&hay, &needle, 1), Some(1));
        assert_eq!(find_from(&hay, &needle, 2), None);
        assert_eq!(find_from(&hay, &[], 0), None);
    }
}
