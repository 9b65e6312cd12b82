//! Document chunking strategies.
//!
//! Two implementations of the [`Chunker`] trait:
//!
//! - [`CharWindowChunker`] — fixed-size sliding window over characters
//! - [`RecursiveChunker`] — prefers paragraph/sentence/word boundaries,
//!   falling back to a hard character cut
//!
//! Both validate their parameters at construction: `chunk_overlap` must be
//! strictly smaller than `chunk_size`.

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no
/// embeddings; the pipeline attaches embeddings later. An empty document
/// yields an empty `Vec`. Chunking has no side effects and is re-derivable
/// from the same document and parameters.
pub trait Chunker: Send + Sync {
    /// Split a document into an ordered sequence of chunks covering its
    /// full text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

fn validate_params(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::Config(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Build a chunk for `document` at `index` with the given text.
fn make_chunk(document: &Document, index: usize, text: String) -> Chunk {
    let mut metadata = document.metadata.clone();
    metadata.insert("chunk_index".to_string(), index.to_string());
    Chunk {
        id: format!("{}_{index}", document.id),
        text,
        embedding: Vec::new(),
        metadata,
        document_id: document.id.clone(),
    }
}

/// Fixed-size sliding window over characters.
///
/// Each chunk holds at most `chunk_size` characters and begins
/// `chunk_size - chunk_overlap` characters after the previous chunk's start,
/// so consecutive chunks share exactly `chunk_overlap` characters. Coverage
/// is gapless: concatenating the first chunk with every later chunk minus
/// its first `chunk_overlap` characters reconstructs the document text.
///
/// All offsets are character positions, never byte positions, so multi-byte
/// UTF-8 input is split safely.
#[derive(Debug, Clone)]
pub struct CharWindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl CharWindowChunker {
    /// Create a new window chunker.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_size == 0` or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_params(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for CharWindowChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end of the text.
        let mut boundaries: Vec<usize> =
            document.text.char_indices().map(|(byte, _)| byte).collect();
        boundaries.push(document.text.len());
        let total_chars = boundaries.len() - 1;

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < total_chars {
            let end = (start + self.chunk_size).min(total_chars);
            let text = document.text[boundaries[start]..boundaries[end]].to_string();
            chunks.push(make_chunk(document, index, text));
            index += 1;
            start += step;
        }

        chunks
    }
}

/// Splits text at natural boundaries: paragraphs, then sentences, then
/// words, hard-cutting by character count only as a last resort.
///
/// Segments at each level are greedily packed into chunks of at most
/// `chunk_size` characters; a segment that alone exceeds `chunk_size` is
/// re-split at the next level down. Overlap applies only to hard character
/// cuts, where no boundary is available to preserve context.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// Boundary levels tried in order, finest last.
const SEPARATORS: &[&str] = &["\n\n", ". ", "! ", "? ", " "];

impl RecursiveChunker {
    /// Create a new recursive chunker.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_size == 0` or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_params(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    fn split(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let char_len = text.chars().count();
        if char_len <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some((separator, rest)) = separators.split_first() else {
            return self.hard_cut(text);
        };

        let segments = split_after(text, separator);
        if segments.len() <= 1 {
            // Separator not present at this level, try the next one.
            return self.split(text, rest);
        }

        // Greedily pack segments, re-splitting any oversized one.
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for segment in segments {
            let segment_len = segment.chars().count();
            if current_len > 0 && current_len + segment_len > self.chunk_size {
                pieces.extend(self.emit(&current, rest));
                current.clear();
                current_len = 0;
            }
            current.push_str(segment);
            current_len += segment_len;
        }
        if !current.is_empty() {
            pieces.extend(self.emit(&current, rest));
        }

        pieces
    }

    /// Emit a packed piece, re-splitting it if it still exceeds the limit.
    fn emit(&self, piece: &str, separators: &[&str]) -> Vec<String> {
        if piece.chars().count() > self.chunk_size {
            self.split(piece, separators)
        } else {
            vec![piece.to_string()]
        }
    }

    /// Last-resort fixed window with overlap, on char boundaries.
    fn hard_cut(&self, text: &str) -> Vec<String> {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
        boundaries.push(text.len());
        let total_chars = boundaries.len() - 1;

        let step = self.chunk_size - self.chunk_overlap;
        let mut pieces = Vec::new();
        let mut start = 0;
        while start < total_chars {
            let end = (start + self.chunk_size).min(total_chars);
            pieces.push(text[boundaries[start]..boundaries[end]].to_string());
            start += step;
        }
        pieces
    }
}

/// Split `text` at every occurrence of `separator`, keeping the separator
/// attached to the end of the preceding segment.
fn split_after<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        segments.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        self.split(&document.text, SEPARATORS)
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .enumerate()
            .map(|(i, text)| make_chunk(document, i, text))
            .collect()
    }
}
