//! Locate passages inside a rendered, node-fragmented document text layer.
//!
//! Queries come from free-form search input or from inline citation
//! markers (`[^1]`, `[^2, ^3]`) in generated answer text. Matching runs an
//! exact pass first and falls back to a normalized fuzzy pass.

pub mod citations;
pub mod config;
pub mod exact;
pub mod flatten;
pub mod fuzzy;
pub mod layer;
pub mod layout;
pub mod pdf;
pub mod search;
pub mod selection;
pub mod types;

pub use citations::{citation_query, parse_citations, resolve_reference};
pub use config::SearchConfig;
pub use exact::find_exact;
pub use fuzzy::{find_fuzzy, similarity};
pub use layer::{Presenter, RenderedDocument, TextLayerSource};
pub use search::{SearchSession, SearchState, locate};
pub use selection::{direct_offset_match, resolve_selection};
pub use types::{
    MatchResult, NodeId, NodeKind, PageTextLayer, Segment, SelectionOffsets, SelectionPoint,
    StoredHighlight, TextNode, TextSelection,
};
