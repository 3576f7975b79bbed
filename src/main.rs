use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use citeseek::{
    RenderedDocument, SearchConfig, StoredHighlight, TextLayerSource, citation_query,
    direct_offset_match, locate, parse_citations, pdf,
};

#[derive(Parser)]
#[command(name = "citeseek", about = "Locate cited passages in PDF text layers")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// JSON file overriding search thresholds
    #[arg(long, global = true, env = "CITESEEK_CONFIG")]
    config: Option<PathBuf>,

    /// Override pdfium library path
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a PDF for a passage, exact first then fuzzy
    Search {
        file: PathBuf,
        query: String,
    },
    /// Resolve citation numbers against a reference list and search for them
    Cite {
        file: PathBuf,
        /// JSON array of reference strings
        #[arg(long)]
        references: PathBuf,
        /// 1-based citation numbers
        #[arg(required = true)]
        numbers: Vec<usize>,
    },
    /// Split answer text into text and citation segments
    Segments {
        text: String,
    },
    /// Re-find a stored highlight by its offsets
    Locate {
        file: PathBuf,
        /// JSON file holding the stored highlight
        highlight: PathBuf,
    },
    /// Dump the text nodes built for each page (debug)
    Layer {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SearchConfig::from_file(path)?,
        None => SearchConfig::default(),
    };

    match &cli.command {
        Command::Search { file, query } => {
            let doc = load_document(&cli, file)?;
            print_output(&locate(&doc, query, &config), cli.pretty)
        }
        Command::Cite { file, references, numbers } => {
            let refs: Vec<String> = read_json(references)?;
            let query = citation_query(numbers, &refs, &config);
            let doc = load_document(&cli, file)?;
            print_output(&locate(&doc, &query, &config), cli.pretty)
        }
        Command::Segments { text } => print_output(&parse_citations(text), cli.pretty),
        Command::Locate { file, highlight } => {
            let highlight: StoredHighlight = read_json(highlight)?;
            let doc = load_document(&cli, file)?;
            print_output(&direct_offset_match(&doc, &highlight, &config), cli.pretty)
        }
        Command::Layer { file } => {
            let doc = load_document(&cli, file)?;
            print_layer(&doc);
            Ok(())
        }
    }
}

fn load_document(cli: &Cli, file: &Path) -> Result<RenderedDocument> {
    let pdfium = pdf::bind_pdfium(cli.pdfium_path.as_deref())?;
    pdf::load_text_layers(&pdfium, file)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON: {}", path.display()))
}

fn print_output<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn print_layer(doc: &RenderedDocument) {
    for layer in doc.text_layers() {
        for node in &layer.nodes {
            let preview: String = node.text.chars().take(80).collect();
            println!("p{} n{:<4} | {}", node.id.page + 1, node.id.index, preview);
        }
    }
}
