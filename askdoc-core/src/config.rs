//! Configuration for the RAG pipeline and the service shells.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Tunable pipeline parameters.
///
/// Construct via [`PipelineConfig::builder`], which validates consistency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results returned from vector search.
    pub top_k: usize,
    /// Bound on every remote call (embedding, search, chat).
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            top_k: 4,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the bound applied to every remote call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the [`PipelineConfig`], validating that parameters are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

/// Which vector store backend the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Remote Chroma server (the persistent default).
    Chroma,
    /// Process-local in-memory store, for development.
    Memory,
}

/// Process-level configuration shared by the CLI and the server, loaded from
/// the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Gemini API credential. Required.
    pub api_key: String,
    /// Chroma server host.
    pub chroma_host: String,
    /// Chroma server port.
    pub chroma_port: u16,
    /// Selected vector store backend.
    pub store: StoreBackend,
    /// Path of the corpus document to index at startup.
    pub document_path: String,
    /// Target collection name.
    pub collection: String,
    /// HTTP server bind address.
    pub bind_addr: String,
    /// Pipeline parameters.
    pub pipeline: PipelineConfig,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `GOOGLE_API_KEY` is required; everything else has a default:
    /// `CHROMA_HOST` (localhost), `CHROMA_PORT` (8000), `ASKDOC_STORE`
    /// (chroma), `ASKDOC_DOCUMENT` (dummy_document.txt), `ASKDOC_COLLECTION`
    /// (rag_collection), `ASKDOC_BIND` (0.0.0.0:8080), `ASKDOC_TIMEOUT_SECS`
    /// (30).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the credential is absent or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .map_err(|_| RagError::Config("GOOGLE_API_KEY is not set".to_string()))?;
        if api_key.is_empty() {
            return Err(RagError::Config("GOOGLE_API_KEY is empty".to_string()));
        }

        let chroma_port: u16 = env_or("CHROMA_PORT", "8000")
            .parse()
            .map_err(|_| RagError::Config("CHROMA_PORT must be a port number".to_string()))?;

        let store = match env_or("ASKDOC_STORE", "chroma").as_str() {
            "chroma" => StoreBackend::Chroma,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(RagError::Config(format!(
                    "ASKDOC_STORE must be 'chroma' or 'memory', got '{other}'"
                )));
            }
        };

        let timeout_secs: u64 = env_or("ASKDOC_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|_| RagError::Config("ASKDOC_TIMEOUT_SECS must be an integer".to_string()))?;

        let pipeline = PipelineConfig::builder()
            .request_timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            api_key,
            chroma_host: env_or("CHROMA_HOST", "localhost"),
            chroma_port,
            store,
            document_path: env_or("ASKDOC_DOCUMENT", "dummy_document.txt"),
            collection: env_or("ASKDOC_COLLECTION", "rag_collection"),
            bind_addr: env_or("ASKDOC_BIND", "0.0.0.0:8080"),
            pipeline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.top_k, 4);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let err = PipelineConfig::builder().chunk_size(100).chunk_overlap(100).build();
        assert!(matches!(err, Err(RagError::Config(_))));

        let err = PipelineConfig::builder().chunk_size(100).chunk_overlap(200).build();
        assert!(matches!(err, Err(RagError::Config(_))));
    }

    #[test]
    fn rejects_zero_chunk_size_and_top_k() {
        assert!(PipelineConfig::builder().chunk_size(0).build().is_err());
        assert!(PipelineConfig::builder().top_k(0).build().is_err());
    }
}
