use std::path::Path;

use anyhow::{Context, Result};
use pdfium_render::prelude::*;
use tracing::debug;

use crate::layer::RenderedDocument;
use crate::layout;
use crate::types::{NodeKind, PageChars, PdfChar};

/// Bind pdfium from an explicit path or the system library.
pub fn bind_pdfium(pdfium_path: Option<&str>) -> Result<Pdfium> {
    let bindings = if let Some(path) = pdfium_path {
        Pdfium::bind_to_library(path)
            .with_context(|| format!("Failed to load pdfium from: {path}"))?
    } else {
        Pdfium::bind_to_system_library()
            .context("Failed to find pdfium. Install pdfium-binaries or use --pdfium-path")?
    };
    Ok(Pdfium::new(bindings))
}

/// Load a PDF and build its text layer: one node per styled run of a line.
pub fn load_text_layers(pdfium: &Pdfium, path: &Path) -> Result<RenderedDocument> {
    let page_chars = extract_chars(pdfium, path)?;
    let mut doc = RenderedDocument::new();
    for page in &page_chars {
        let idx = doc.push_page();
        let runs = layout::text_runs(page);
        debug!(page = idx, runs = runs.len(), "built text layer");
        for run in runs {
            doc.push_node(idx, run, NodeKind::Text);
        }
    }
    Ok(doc)
}

/// Extract characters with positions from every page.
pub fn extract_chars(pdfium: &Pdfium, path: &Path) -> Result<Vec<PageChars>> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .with_context(|| format!("Failed to load PDF: {}", path.display()))?;

    document
        .pages()
        .iter()
        .enumerate()
        .map(|(idx, page)| extract_page_chars(idx, &page))
        .collect()
}

fn extract_page_chars(page_idx: usize, page: &PdfPage) -> Result<PageChars> {
    let text_page = page
        .text()
        .with_context(|| format!("Failed to load text for page {}", page_idx + 1))?;

    let chars: Vec<PdfChar> = text_page
        .chars()
        .iter()
        .filter_map(|ch| convert_text_char(&ch))
        .collect();

    Ok(PageChars {
        width: page.width().value,
        chars,
    })
}

fn convert_text_char(ch: &PdfPageTextChar) -> Option<PdfChar> {
    let unicode = ch.unicode_char()?;
    if unicode.is_control() && unicode != ' ' {
        return None;
    }

    // zero-size glyphs are watermarks or hidden text
    let font_size = ch.scaled_font_size().value;
    if font_size < 0.5 {
        return None;
    }

    let rect = ch.loose_bounds().or_else(|_| ch.tight_bounds()).ok()?;
    Some(PdfChar {
        ch: unicode,
        x: rect.left().value,
        y: rect.bottom().value,
        width: (rect.right().value - rect.left().value).abs(),
        font_size,
    })
}
