//! RAG pipeline orchestrator.
//!
//! [`RagPipeline`] composes a [`Chunker`], an [`EmbeddingProvider`], a
//! [`VectorStore`], and an [`AnswerSynthesizer`] into the full
//! ingest-and-answer workflow. The pipeline is immutable after construction
//! and shared across queries via `Arc`; no query mutates the store.
//!
//! # Example
//!
//! ```rust,ignore
//! use askdoc_core::{PipelineConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(PipelineConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(store))
//!     .chunker(Arc::new(chunker))
//!     .synthesizer(AnswerSynthesizer::new(Arc::new(model)))
//!     .build()?;
//!
//! pipeline.index("docs", &document).await?;
//! let answer = pipeline.answer("docs", "what does the corpus say?").await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::PipelineConfig;
use crate::document::{Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::synthesizer::AnswerSynthesizer;
use crate::vectorstore::VectorStore;

/// The RAG pipeline orchestrator.
///
/// Indexing runs once per process lifetime (chunk → embed → upsert); queries
/// run embed → search → synthesize. Every remote call is bounded by the
/// configured request timeout.
pub struct RagPipeline {
    config: PipelineConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    synthesizer: AnswerSynthesizer,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Bound a remote call by the configured request timeout.
    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                error!(operation, timeout = ?self.config.request_timeout, "remote call timed out");
                Err(RagError::Timeout { operation: operation.to_string() })
            }
        }
    }

    /// Index a document into `collection`: chunk → embed → upsert.
    ///
    /// Returns the number of chunks stored. A document that yields no chunks
    /// is a no-op. If the collection already holds entries, indexing is
    /// skipped and the existing count is returned: collections are
    /// build-once and re-running the build must not duplicate entries.
    ///
    /// # Errors
    ///
    /// Propagates [`RagError::Embedding`] from the embedding service,
    /// [`RagError::StoreUnavailable`] from the vector store, and
    /// [`RagError::Timeout`] when a remote call exceeds the bound.
    pub async fn index(&self, collection: &str, document: &Document) -> Result<usize> {
        let dimensions = self.embedding_provider.dimensions();
        self.bounded("ensure_collection", self.vector_store.ensure_collection(collection, dimensions))
            .await?;

        let existing = self.bounded("count", self.vector_store.count(collection)).await?;
        if existing > 0 {
            info!(collection, existing, "collection already populated, skipping indexing");
            return Ok(existing);
        }

        let chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            info!(document.id = %document.id, chunk_count = 0, "indexed document (empty)");
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self
            .bounded("embed", self.embedding_provider.embed_batch(&texts))
            .await
            .inspect_err(|e| {
                error!(document.id = %document.id, error = %e, "embedding failed during indexing");
            })?;

        let mut chunks = chunks;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.bounded("upsert", self.vector_store.upsert(collection, &chunks))
            .await
            .inspect_err(|e| {
                error!(document.id = %document.id, error = %e, "upsert failed during indexing");
            })?;

        let chunk_count = chunks.len();
        info!(document.id = %document.id, chunk_count, collection, "indexed document");
        Ok(chunk_count)
    }

    /// Retrieve the chunks most similar to `query` from `collection`.
    ///
    /// Returns at most `top_k` results sorted by descending similarity. An
    /// empty collection yields an empty vector, not an error.
    pub async fn retrieve(&self, collection: &str, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self
            .bounded("embed", self.embedding_provider.embed(query))
            .await
            .inspect_err(|e| error!(error = %e, "query embedding failed"))?;

        let results = self
            .bounded(
                "search",
                self.vector_store.search(collection, &query_embedding, self.config.top_k),
            )
            .await
            .inspect_err(|e| error!(collection, error = %e, "vector store search failed"))?;

        info!(collection, result_count = results.len(), "retrieved context");
        Ok(results)
    }

    /// Answer `query` from `collection`: retrieve, then synthesize.
    ///
    /// # Errors
    ///
    /// Propagates retrieval errors and [`RagError::Chat`] from the
    /// chat-completion service, unretried.
    pub async fn answer(&self, collection: &str, query: &str) -> Result<String> {
        let context = self.retrieve(collection, query).await?;
        self.bounded("chat", self.synthesizer.synthesize(query, &context))
            .await
            .inspect_err(|e| error!(error = %e, "answer synthesis failed"))
    }
}

/// Builder for constructing a [`RagPipeline`]. All fields are required.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<PipelineConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    synthesizer: Option<AnswerSynthesizer>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the answer synthesizer.
    pub fn synthesizer(mut self, synthesizer: AnswerSynthesizer) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Build the [`RagPipeline`], validating that all fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| RagError::Config("synthesizer is required".to_string()))?;

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker, synthesizer })
    }
}
