use serde::{Deserialize, Serialize};

/// A character extracted from a PDF page with position and font info.
#[derive(Debug, Clone)]
pub struct PdfChar {
    pub ch: char,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
}

/// All characters on a single PDF page.
#[derive(Debug)]
pub struct PageChars {
    pub width: f32,
    pub chars: Vec<PdfChar>,
}

/// A word: sequence of characters forming a unit.
#[derive(Debug, Clone)]
pub struct Word {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub is_superscript: bool,
}

/// A line of text: sequence of words on the same baseline.
#[derive(Debug, Clone)]
pub struct Line {
    pub words: Vec<Word>,
    pub y: f32,
}

/// Structural identity of a rendered text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId {
    pub page: usize,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// A leaf text run.
    Text,
    /// Decorative container whose text repeats its children.
    MarkedContent,
}

/// One leaf of a page's text layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextNode {
    pub id: NodeId,
    pub text: String,
    pub kind: NodeKind,
}

impl TextNode {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_decorative(&self) -> bool {
        self.kind == NodeKind::MarkedContent
    }
}

/// The ordered text nodes rendered for one page.
#[derive(Debug, Clone, Default)]
pub struct PageTextLayer {
    pub nodes: Vec<TextNode>,
}

/// A piece of parsed answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text {
        content: String,
        key: String,
    },
    Citation {
        numbers: Vec<usize>,
        /// Marker body without the surrounding brackets, e.g. `^2, ^3`.
        raw_match: String,
        key: String,
    },
}

impl Segment {
    /// The segment as it appeared in the source string.
    pub fn source_text(&self) -> String {
        match self {
            Segment::Text { content, .. } => content.clone(),
            Segment::Citation { raw_match, .. } => format!("[{raw_match}]"),
        }
    }
}

/// A located passage: the nodes of one page that cover it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub page_index: usize,
    pub match_index: usize,
    pub nodes: Vec<TextNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl MatchResult {
    /// Similarity of the match; exact matches count as 1.0.
    pub fn score(&self) -> f64 {
        self.similarity.unwrap_or(1.0)
    }
}

/// A user selection converted to document-wide character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionOffsets {
    pub start: usize,
    pub end: usize,
    pub page_number: usize,
}

/// One end of an interactive selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPoint {
    pub node: NodeId,
    pub offset: usize,
}

/// A selection range as reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub start: SelectionPoint,
    pub end: SelectionPoint,
}

impl TextSelection {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// A persisted highlight whose offsets are hints into the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredHighlight {
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
}
