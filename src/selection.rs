use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::fuzzy::similarity;
use crate::layer::TextLayerSource;
use crate::types::{NodeId, SelectionOffsets, StoredHighlight, TextNode, TextSelection};

/// A node's slot in the document-wide offset space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeInterval {
    start: usize,
    end: usize,
    page: usize,
}

/// Running character offsets over every text node of every page, with no
/// separators between nodes.
struct DocumentOffsets<'a> {
    nodes: Vec<(&'a TextNode, NodeInterval)>,
    by_id: HashMap<NodeId, NodeInterval>,
}

impl<'a> DocumentOffsets<'a> {
    fn build(doc: &'a dyn TextLayerSource) -> Self {
        let mut nodes = Vec::new();
        let mut by_id = HashMap::new();
        let mut offset = 0;
        for (page, layer) in doc.text_layers().iter().enumerate() {
            for node in layer.nodes.iter().filter(|n| !n.is_decorative()) {
                let len = node.char_len();
                let interval = NodeInterval { start: offset, end: offset + len, page };
                nodes.push((node, interval));
                by_id.insert(node.id, interval);
                offset += len;
            }
        }
        Self { nodes, by_id }
    }

    fn locate(&self, id: NodeId, local: usize) -> Option<(usize, usize)> {
        self.by_id.get(&id).map(|iv| {
            let clamped = local.min(iv.end - iv.start);
            (iv.start + clamped, iv.page)
        })
    }
}

/// Convert a live selection into document offsets.
///
/// Returns `None` when nothing is selected, the selection is collapsed, or
/// either end sits outside the tracked text layers.
pub fn resolve_selection(
    doc: &dyn TextLayerSource,
    selection: Option<&TextSelection>,
) -> Option<SelectionOffsets> {
    let selection = selection.filter(|s| !s.is_collapsed())?;
    let offsets = DocumentOffsets::build(doc);

    let (mut start, page_number) = offsets.locate(selection.start.node, selection.start.offset)?;
    let (mut end, _) = offsets.locate(selection.end.node, selection.end.offset)?;
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    if start == end {
        return None;
    }
    Some(SelectionOffsets { start, end, page_number })
}

/// Re-find a stored highlight by trusting its offsets, provided the text
/// found there still resembles the stored text.
pub fn direct_offset_match(
    doc: &dyn TextLayerSource,
    highlight: &StoredHighlight,
    config: &SearchConfig,
) -> Vec<TextNode> {
    let (Some(start), Some(end)) = (highlight.start_offset, highlight.end_offset) else {
        warn!("stored highlight has no offsets");
        return Vec::new();
    };

    let offsets = DocumentOffsets::build(doc);
    let nodes: Vec<TextNode> = offsets
        .nodes
        .iter()
        .filter(|(_, iv)| {
            (iv.start <= start && iv.end > start)
                || (iv.start >= start && iv.end <= end)
                || (iv.start < end && iv.end >= end)
                || (start <= iv.start && end >= iv.end)
        })
        .map(|(node, _)| (*node).clone())
        .collect();

    let combined = nodes
        .iter()
        .map(|n| n.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let score = similarity(&combined, &highlight.raw_text.to_lowercase());
    debug!(start, end, nodes = nodes.len(), score, "direct offset probe");

    if score > config.direct_offset_threshold {
        nodes
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::RenderedDocument;
    use crate::types::{NodeKind, SelectionPoint};

    fn point(page: usize, index: usize, offset: usize) -> SelectionPoint {
        SelectionPoint { node: NodeId { page, index }, offset }
    }

    fn doc() -> RenderedDocument {
        RenderedDocument::from_pages([vec!["Hello ", "world"], vec!["second ", "page"]])
    }

    #[test]
    fn forward_selection_across_pages() {
        let doc = doc();
        let sel = TextSelection { start: point(0, 1, 2), end: point(1, 0, 3) };
        let got = resolve_selection(&doc, Some(&sel)).unwrap();
        assert_eq!(got, SelectionOffsets { start: 8, end: 14, page_number: 0 });
    }

    #[test]
    fn backward_selection_is_swapped() {
        let doc = doc();
        let sel = TextSelection { start: point(1, 1, 2), end: point(0, 0, 1) };
        let got = resolve_selection(&doc, Some(&sel)).unwrap();
        assert!(got.start <= got.end);
        assert_eq!((got.start, got.end), (1, 20));
        assert_eq!(got.page_number, 1);
    }

    #[test]
    fn unresolvable_or_empty_selection_is_none() {
        let doc = doc();
        assert!(resolve_selection(&doc, None).is_none());
        let collapsed = TextSelection { start: point(0, 0, 1), end: point(0, 0, 1) };
        assert!(resolve_selection(&doc, Some(&collapsed)).is_none());
        // end of one node to the start of the next covers no text
        let empty = TextSelection { start: point(0, 0, 6), end: point(0, 1, 0) };
        assert!(resolve_selection(&doc, Some(&empty)).is_none());
        let outside = TextSelection { start: point(0, 0, 0), end: point(7, 0, 1) };
        assert!(resolve_selection(&doc, Some(&outside)).is_none());
    }

    #[test]
    fn decorative_nodes_are_not_tracked() {
        let mut doc = RenderedDocument::new();
        let p = doc.push_page();
        let deco = doc.push_node(p, "abc", NodeKind::MarkedContent);
        doc.push_node(p, "abc", NodeKind::Text);
        let sel = TextSelection {
            start: SelectionPoint { node: deco, offset: 0 },
            end: point(0, 1, 2),
        };
        assert!(resolve_selection(&doc, Some(&sel)).is_none());
    }

    #[test]
    fn direct_offsets_accept_matching_text() {
        let doc = doc();
        let hl = StoredHighlight {
            raw_text: "Hello world".into(),
            start_offset: Some(0),
            end_offset: Some(11),
            page_number: Some(0),
        };
        let nodes = direct_offset_match(&doc, &hl, &SearchConfig::default());
        let texts: Vec<_> = nodes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello ", "world"]);
    }

    #[test]
    fn direct_offsets_reject_stale_text() {
        let doc = doc();
        let hl = StoredHighlight {
            raw_text: "something else entirely".into(),
            start_offset: Some(0),
            end_offset: Some(11),
            page_number: None,
        };
        assert!(direct_offset_match(&doc, &hl, &SearchConfig::default()).is_empty());
        let no_offsets = StoredHighlight { start_offset: None, ..hl };
        assert!(direct_offset_match(&doc, &no_offsets, &SearchConfig::default()).is_empty());
    }
}
