//! Error types for the `askdoc-core` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
///
/// Every variant is surfaced to the caller unchanged: components detect and
/// log a failure but never attempt recovery or retries.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid configuration: bad chunking parameters, a missing required
    /// field, or a missing credential. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The embedding service call failed.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat-completion service call failed.
    #[error("Chat error ({provider}): {message}")]
    Chat {
        /// The chat provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector store is unreachable or rejected an operation.
    #[error("Vector store unavailable ({backend}): {message}")]
    StoreUnavailable {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A remote call exceeded the configured request timeout.
    #[error("Remote call timed out during {operation}")]
    Timeout {
        /// The operation that timed out (embed, search, upsert, chat).
        operation: String,
    },

    /// Failed to read a corpus file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
