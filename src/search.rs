use tracing::info;

use crate::citations::citation_query;
use crate::config::SearchConfig;
use crate::exact::find_exact;
use crate::fuzzy::find_fuzzy;
use crate::layer::{Presenter, TextLayerSource};
use crate::types::MatchResult;

/// Where a session stands. Searches complete synchronously, so there is
/// no observable in-between state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    #[default]
    Idle,
    Found {
        results: Vec<MatchResult>,
        current: usize,
    },
    NotFound,
}

/// Exact-then-fuzzy lookup over the current text layer, plus match
/// navigation and highlight presentation.
#[derive(Debug, Default)]
pub struct SearchSession {
    config: SearchConfig,
    state: SearchState,
}

/// Run the exact pass and fall back to the fuzzy pass on zero results.
pub fn locate(doc: &dyn TextLayerSource, query: &str, config: &SearchConfig) -> Vec<MatchResult> {
    let exact = find_exact(doc, query);
    if !exact.is_empty() {
        return exact;
    }
    info!("no exact matches, trying fuzzy search");
    find_fuzzy(doc, query, config)
}

impl SearchSession {
    pub fn new(config: SearchConfig) -> Self {
        Self { config, state: SearchState::Idle }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn results(&self) -> &[MatchResult] {
        match &self.state {
            SearchState::Found { results, .. } => results,
            _ => &[],
        }
    }

    pub fn current(&self) -> Option<&MatchResult> {
        match &self.state {
            SearchState::Found { results, current } => results.get(*current),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.state == SearchState::NotFound
    }

    /// Search from scratch and show the first match. Blank text clears.
    pub fn search<D>(&mut self, doc: &mut D, text: &str)
    where
        D: TextLayerSource + Presenter,
    {
        if text.trim().is_empty() {
            self.clear_search(doc);
            return;
        }
        let results = locate(&*doc, text, &self.config);
        if results.is_empty() {
            info!(query = %text, "no matches found");
            clear_marks(doc);
            self.state = SearchState::NotFound;
            return;
        }
        self.state = SearchState::Found { results, current: 0 };
        self.show_current(doc);
    }

    /// Search for the references behind a clicked citation marker.
    pub fn search_citation<D>(&mut self, doc: &mut D, numbers: &[usize], references: &[String])
    where
        D: TextLayerSource + Presenter,
    {
        let query = citation_query(numbers, references, &self.config);
        self.search(doc, &query);
    }

    pub fn next_match<D: Presenter>(&mut self, doc: &mut D) {
        self.step(doc, 1);
    }

    pub fn previous_match<D: Presenter>(&mut self, doc: &mut D) {
        self.step(doc, -1);
    }

    fn step<D: Presenter>(&mut self, doc: &mut D, delta: isize) {
        let SearchState::Found { results, current } = &mut self.state else {
            return;
        };
        let len = results.len() as isize;
        *current = (*current as isize + delta).rem_euclid(len) as usize;
        self.show_current(doc);
    }

    /// Drop results and every search mark.
    pub fn clear_search<D: Presenter>(&mut self, doc: &mut D) {
        self.state = SearchState::Idle;
        clear_marks(doc);
    }

    fn show_current<D: Presenter>(&self, doc: &mut D) {
        if let Some(result) = self.current() {
            show_match(doc, result);
        }
    }
}

/// Remove search marks, leaving user-highlighted nodes untouched.
pub fn clear_marks<D: Presenter + ?Sized>(doc: &mut D) {
    for node in doc.search_marked() {
        if !doc.has_user_highlight(node) {
            doc.set_search_mark(node, false);
        }
    }
}

/// Bring a match into view and mark its nodes.
pub fn show_match<D: Presenter + ?Sized>(doc: &mut D, result: &MatchResult) {
    clear_marks(doc);
    for node in &result.nodes {
        if !doc.has_user_highlight(node.id) {
            doc.set_search_mark(node.id, true);
        }
    }
    if !doc.is_page_active(result.page_index) {
        doc.scroll_page_into_view(result.page_index);
    }
    if let Some(first) = result.nodes.first() {
        doc.scroll_node_into_view(first.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{RenderedDocument, ScrollTarget};
    use crate::types::NodeId;

    fn doc() -> RenderedDocument {
        RenderedDocument::from_pages([
            vec!["Neural networks learn", "representations."],
            vec!["Deep neural networks", "generalise well."],
        ])
    }

    fn id(page: usize, index: usize) -> NodeId {
        NodeId { page, index }
    }

    #[test]
    fn search_marks_first_match_and_scrolls() {
        let mut doc = doc();
        let mut session = SearchSession::default();
        session.search(&mut doc, "neural networks");
        assert_eq!(session.results().len(), 2);
        assert_eq!(doc.search_marked(), vec![id(0, 0)]);
        assert_eq!(doc.scroll_log(), &[ScrollTarget::Page(0), ScrollTarget::Node(id(0, 0))]);
    }

    #[test]
    fn active_page_is_not_scrolled_again() {
        let mut doc = doc();
        doc.set_active_page(Some(0));
        let mut session = SearchSession::default();
        session.search(&mut doc, "representations");
        assert_eq!(doc.scroll_log(), &[ScrollTarget::Node(id(0, 1))]);
        assert_eq!(doc.search_marked(), vec![id(0, 1)]);
    }

    #[test]
    fn navigation_wraps_both_ways() {
        let mut doc = doc();
        let mut session = SearchSession::default();
        session.search(&mut doc, "neural networks");
        session.next_match(&mut doc);
        assert_eq!(session.current().unwrap().page_index, 1);
        assert_eq!(doc.search_marked(), vec![id(1, 0)]);
        session.next_match(&mut doc);
        assert_eq!(session.current().unwrap().page_index, 0);
        session.previous_match(&mut doc);
        assert_eq!(session.current().unwrap().page_index, 1);
    }

    #[test]
    fn falls_back_to_fuzzy() {
        let mut doc = RenderedDocument::from_pages([vec![
            "We show that attention mechanisms alone suffice",
            "for strong translation quality.",
        ]]);
        let mut session = SearchSession::default();
        session.search(&mut doc, "attention mechanism alone suffices for strong translation");
        let current = session.current().expect("fuzzy match");
        assert!(current.similarity.is_some());
    }

    #[test]
    fn not_found_after_both_passes() {
        let mut doc = doc();
        let mut session = SearchSession::default();
        session.search(&mut doc, "photosynthesis in chloroplasts");
        assert!(session.is_not_found());
        assert!(session.results().is_empty());
        session.next_match(&mut doc);
        session.previous_match(&mut doc);
        assert!(session.is_not_found());
    }

    #[test]
    fn clear_keeps_user_highlights() {
        let mut doc = doc();
        doc.set_user_highlight(id(0, 0), true);
        let mut session = SearchSession::default();
        session.search(&mut doc, "learn representations");
        assert_eq!(doc.search_marked(), vec![id(0, 1)]);
        session.clear_search(&mut doc);
        assert_eq!(session.state(), &SearchState::Idle);
        assert!(doc.search_marked().is_empty());
        assert!(doc.has_user_highlight(id(0, 0)));
    }

    #[test]
    fn blank_search_clears() {
        let mut doc = doc();
        let mut session = SearchSession::default();
        session.search(&mut doc, "networks");
        session.search(&mut doc, "   ");
        assert_eq!(session.state(), &SearchState::Idle);
        assert!(doc.search_marked().is_empty());
    }

    #[test]
    fn citation_click_searches_resolved_reference() {
        let mut doc = doc();
        let refs = vec!["Deep neural networks generalise well.".to_string()];
        let mut session = SearchSession::default();
        session.search_citation(&mut doc, &[1], &refs);
        let current = session.current().unwrap();
        assert_eq!(current.page_index, 1);
        assert_eq!(doc.search_marked(), vec![id(1, 0), id(1, 1)]);
    }
}
