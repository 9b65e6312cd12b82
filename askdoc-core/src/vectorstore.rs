//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of [`Chunk`]s. The similarity
/// metric is owned by the backend; callers only see descending scores.
/// Collections are build-once in this service: upserts are at-least-once and
/// never deduplicated, so callers populate a collection exactly once per
/// store lifetime.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection if it does not exist yet.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` chunks most similar to the given embedding.
    ///
    /// Returns results ordered by descending similarity score. An empty or
    /// unknown collection yields an empty vector, not an error.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of chunks stored in a collection (0 when absent).
    async fn count(&self, collection: &str) -> Result<usize>;
}
