//! Data types for documents, chunks, and search results.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A source document. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The full text content.
    pub text: String,
    /// Key-value metadata (e.g. the source path).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document from raw text with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new() }
    }
}

/// Load a UTF-8 text file as a [`Document`].
///
/// The document id is the file stem and the metadata records the source path.
///
/// # Errors
///
/// Returns [`RagError::Io`](crate::RagError::Io) if the file cannot be read.
pub fn load_text_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;

    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), path.display().to_string());

    Ok(Document { id, text, metadata })
}

/// A contiguous segment of a [`Document`] with its vector embedding.
///
/// Chunks are created by a [`Chunker`](crate::Chunker) with an empty
/// embedding; the pipeline attaches the vector before storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{document_id}_{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus `chunk_index`.
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with a similarity score (higher is closer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score.
    pub score: f32,
}
