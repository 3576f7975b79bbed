use strsim::normalized_levenshtein;
use tracing::debug;

use crate::config::SearchConfig;
use crate::flatten::{FlatPage, Normalized, find_from, normalize, normalize_str};
use crate::layer::TextLayerSource;
use crate::types::MatchResult;

/// `1 - edit_distance / max_len`, in chars. Two empty strings score 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// Approximate search over normalized page text.
///
/// Candidate windows start wherever the query's normalized prefix (the
/// seed) occurs; each window is scored against the whole normalized query
/// and kept above `fuzzy_threshold`. Results are ordered by similarity,
/// best first, ties in discovery order.
pub fn find_fuzzy(doc: &dyn TextLayerSource, query: &str, config: &SearchConfig) -> Vec<MatchResult> {
    let norm_query = normalize_str(query);
    let seed: Vec<char> = norm_query.chars().take(config.seed_len).collect();
    if seed.is_empty() {
        return Vec::new();
    }
    let query_len = norm_query.chars().count();
    let window_len = query_len.max(seed.len() * 2);

    let mut results = Vec::new();
    for (page_index, layer) in doc.text_layers().iter().enumerate() {
        let flat = FlatPage::build(page_index, layer);
        if flat.is_empty() {
            continue;
        }
        let norm_page = normalize(&flat.chars);
        let before = results.len();
        let probe = Probe { norm_query: &norm_query, seed: &seed, window_len, threshold: config.fuzzy_threshold };
        probe.scan_page(&flat, &norm_page, &mut results);
        debug!(page = page_index, matches = results.len() - before, "fuzzy scan");
    }

    // stable: equal scores keep discovery order
    results.sort_by(|a, b| b.score().total_cmp(&a.score()));
    results
}

struct Probe<'q> {
    norm_query: &'q str,
    seed: &'q [char],
    window_len: usize,
    threshold: f64,
}

impl Probe<'_> {
    fn scan_page(&self, flat: &FlatPage<'_>, norm_page: &Normalized, results: &mut Vec<MatchResult>) {
        let page_chars = &norm_page.chars;
        let mut cursor = 0;
        let mut match_index = 0;

        while let Some(found) = find_from(page_chars, self.seed, cursor) {
            let window_end = (found + self.window_len).min(page_chars.len());
            let window: String = page_chars[found..window_end].iter().collect();
            let score = similarity(self.norm_query, &window);

            if score > self.threshold {
                let start = norm_page.mapping.to_original(found);
                let end = norm_page.mapping.to_original_end(window_end);
                let nodes = flat.nodes_intersecting(start, end);
                if !nodes.is_empty() {
                    results.push(MatchResult {
                        page_index: flat.page_index,
                        match_index,
                        nodes,
                        similarity: Some(score),
                    });
                    match_index += 1;
                }
            }
            cursor = found + self.seed.len();
        }
    }
}
