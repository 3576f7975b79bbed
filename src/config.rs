use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables for the matchers and citation resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Length of the normalized query prefix used to seed fuzzy windows.
    pub seed_len: usize,
    /// Fuzzy windows must score strictly above this.
    pub fuzzy_threshold: f64,
    /// Stored-offset lookups must score strictly above this.
    pub direct_offset_threshold: f64,
    /// Query text used for a citation number with no reference.
    pub not_found_placeholder: String,
    /// Joins the reference texts of a multi-number citation.
    pub citation_separator: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            seed_len: 15,
            fuzzy_threshold: 0.5,
            direct_offset_threshold: 0.7,
            not_found_placeholder: "Citation not found".to_string(),
            citation_separator: "\n\n".to_string(),
        }
    }
}

impl SearchConfig {
    /// Load a JSON config file; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config JSON: {}", path.display()))
    }
}
