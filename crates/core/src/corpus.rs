//! Labeled input documents and ingestion helpers
//!
//! The pipeline consumes records prepared by an external collection step.
//! This module cleans the raw text, applies the minimum-length policy and
//! reads tabular input files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;

/// A labeled input document. Immutable once tokenized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Opaque identifier assigned at collection time
    pub id: String,

    /// Raw text of the post or comment
    pub text: String,

    /// Categorical target label (e.g. "left", "center", "right")
    pub label: String,

    /// Optional continuous left-right score in [-1, 1]
    #[serde(default)]
    pub score: Option<f64>,
}

impl Document {
    /// Create a document without a continuous score
    pub fn new(id: impl Into<String>, text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            label: label.into(),
            score: None,
        }
    }

    /// Attach a continuous left-right score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Normalize raw scraped text: drop control characters and collapse runs
/// of whitespace (including newlines) into single spaces.
pub fn clean_text(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !c.is_control() || *c == ' ' || *c == '\n' || *c == '\t')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Apply the minimum-length policy: documents with fewer than `min_chars`
/// characters after cleaning are excluded. The exclusion count is logged
/// and returned so callers can surface it.
pub fn filter_short_documents(documents: Vec<Document>, min_chars: usize) -> (Vec<Document>, usize) {
    let before = documents.len();
    let kept: Vec<Document> = documents
        .into_iter()
        .map(|mut doc| {
            doc.text = clean_text(&doc.text);
            doc
        })
        .filter(|doc| doc.text.chars().count() >= min_chars)
        .collect();
    let excluded = before - kept.len();

    if excluded > 0 {
        tracing::info!(
            excluded,
            kept = kept.len(),
            min_chars,
            "excluded short documents at ingestion"
        );
    }

    (kept, excluded)
}

/// Read labeled documents from a CSV file with an `id,text,label[,score]`
/// header.
pub fn read_documents_csv(path: impl AsRef<Path>) -> PipelineResult<Vec<Document>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut documents = Vec::new();
    for record in reader.deserialize() {
        let document: Document = record?;
        documents.push(document);
    }

    tracing::info!(documents = documents.len(), "loaded labeled documents");
    Ok(documents)
}
