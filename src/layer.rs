use std::collections::BTreeSet;

use crate::types::{NodeId, NodeKind, PageTextLayer, TextNode};

/// Read access to the rendered text layers, one per page, in page order.
pub trait TextLayerSource {
    fn text_layers(&self) -> &[PageTextLayer];

    fn node(&self, id: NodeId) -> Option<&TextNode> {
        self.text_layers()
            .get(id.page)
            .and_then(|layer| layer.nodes.get(id.index))
    }
}

/// Presentation side effects the search session drives.
pub trait Presenter {
    fn is_page_active(&self, page: usize) -> bool;
    fn scroll_page_into_view(&mut self, page: usize);
    fn scroll_node_into_view(&mut self, node: NodeId);
    /// Add or remove the search mark. Idempotent.
    fn set_search_mark(&mut self, node: NodeId, marked: bool);
    fn search_marked(&self) -> Vec<NodeId>;
    /// Nodes painted by a persisted user highlight keep their styling.
    fn has_user_highlight(&self, node: NodeId) -> bool;
}

/// In-memory text layer with presentation state.
#[derive(Debug, Default)]
pub struct RenderedDocument {
    layers: Vec<PageTextLayer>,
    active_page: Option<usize>,
    marked: BTreeSet<NodeId>,
    user_highlights: BTreeSet<NodeId>,
    scroll_log: Vec<ScrollTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Page(usize),
    Node(NodeId),
}

impl RenderedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from plain node texts, one `Vec` per page.
    pub fn from_pages<P, S>(pages: P) -> Self
    where
        P: IntoIterator,
        P::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = Self::new();
        for page in pages {
            let idx = doc.push_page();
            for text in page {
                doc.push_node(idx, text, NodeKind::Text);
            }
        }
        doc
    }

    pub fn push_page(&mut self) -> usize {
        self.layers.push(PageTextLayer::default());
        self.layers.len() - 1
    }

    /// Append a node to `page`, returning its id.
    pub fn push_node(&mut self, page: usize, text: impl Into<String>, kind: NodeKind) -> NodeId {
        let layer = &mut self.layers[page];
        let id = NodeId { page, index: layer.nodes.len() };
        layer.nodes.push(TextNode { id, text: text.into(), kind });
        id
    }

    pub fn set_active_page(&mut self, page: Option<usize>) {
        self.active_page = page;
    }

    pub fn set_user_highlight(&mut self, node: NodeId, on: bool) {
        if on {
            self.user_highlights.insert(node);
        } else {
            self.user_highlights.remove(&node);
        }
    }

    pub fn scroll_log(&self) -> &[ScrollTarget] {
        &self.scroll_log
    }
}

impl TextLayerSource for RenderedDocument {
    fn text_layers(&self) -> &[PageTextLayer] {
        &self.layers
    }
}

impl Presenter for RenderedDocument {
    fn is_page_active(&self, page: usize) -> bool {
        self.active_page == Some(page)
    }

    fn scroll_page_into_view(&mut self, page: usize) {
        self.scroll_log.push(ScrollTarget::Page(page));
        self.active_page = Some(page);
    }

    fn scroll_node_into_view(&mut self, node: NodeId) {
        self.scroll_log.push(ScrollTarget::Node(node));
    }

    fn set_search_mark(&mut self, node: NodeId, marked: bool) {
        if marked {
            self.marked.insert(node);
        } else {
            self.marked.remove(&node);
        }
    }

    fn search_marked(&self) -> Vec<NodeId> {
        self.marked.iter().copied().collect()
    }

    fn has_user_highlight(&self, node: NodeId) -> bool {
        self.user_highlights.contains(&node)
    }
}
