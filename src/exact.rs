use tracing::debug;

use crate::flatten::{FlatPage, find_from, fold_char, fold_chars};
use crate::layer::TextLayerSource;
use crate::types::MatchResult;

/// Find every case-insensitive occurrence of `query`, overlapping ones
/// included, and resolve each to the nodes that cover it.
pub fn find_exact(doc: &dyn TextLayerSource, query: &str) -> Vec<MatchResult> {
    let needle = fold_chars(query);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut results = Vec::new();
    for (page_index, layer) in doc.text_layers().iter().enumerate() {
        let flat = FlatPage::build(page_index, layer);
        if flat.is_empty() {
            continue;
        }
        let before = results.len();
        search_page(&flat, &needle, &mut results);
        debug!(page = page_index, matches = results.len() - before, "exact scan");
    }
    results
}

fn search_page(flat: &FlatPage<'_>, needle: &[char], results: &mut Vec<MatchResult>) {
    let haystack: Vec<char> = flat.chars.iter().map(|&c| fold_char(c)).collect();
    let mut cursor = 0;
    let mut match_index = 0;

    while let Some(found) = find_from(&haystack, needle, cursor) {
        let nodes = flat.nodes_covering(found, found + needle.len());
        if !nodes.is_empty() {
            results.push(MatchResult {
                page_index: flat.page_index,
                match_index,
                nodes,
                similarity: None,
            });
            match_index += 1;
        }
        cursor = found + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::RenderedDocument;

    fn joined(result: &MatchResult) -> String {
        result.nodes.iter().map(|n| n.text.as_str()).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn single_word_match() {
        let doc = RenderedDocument::from_pages([vec!["the quick", "brown fox"]]);
        let results = find_exact(&doc, "quick");
        assert_eq!(results.len(), 1);
        assert!(joined(&results[0]).contains("quick"));
        assert_eq!(results[0].similarity, None);
        assert_eq!(results[0].score(), 1.0);
    }

    #[test]
    fn overlapping_occurrences_are_reported() {
        let doc = RenderedDocument::from_pages([vec!["aaa"]]);
        let results = find_exact(&doc, "aa");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].match_index, 0);
        assert_eq!(results[1].match_index, 1);
    }

    #[test]
    fn case_insensitive_across_nodes() {
        let doc = RenderedDocument::from_pages([vec!["Deep", "LEARNING", "models"]]);
        let results = find_exact(&doc, "deep learning");
        assert_eq!(results.len(), 1);
        let texts: Vec<_> = results[0].nodes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["Deep", "LEARNING"]);
    }

    #[test]
    fn match_index_is_per_page_and_pages_stay_ordered() {
        let doc = RenderedDocument::from_pages([
            vec!["cat and cat"],
            vec!["no felines"],
            vec!["a cat"],
        ]);
        let results = find_exact(&doc, "cat");
        let got: Vec<_> = results.iter().map(|r| (r.page_index, r.match_index)).collect();
        assert_eq!(got, vec![(0, 0), (0, 1), (2, 0)]);
        assert!(results.iter().all(|r| r.nodes.iter().all(|n| n.id.page == r.page_index)));
    }

    #[test]
    fn empty_query_and_empty_pages() {
        let doc = RenderedDocument::from_pages([Vec::<&str>::new(), vec!["  "]]);
        assert!(find_exact(&doc, "x").is_empty());
        let doc = RenderedDocument::from_pages([vec!["text"]]);
        assert!(find_exact(&doc, "").is_empty());
    }
}
