//! Core RAG pipeline for the askdoc question-answering service.
//!
//! askdoc ingests a text corpus, chunks and embeds it into a vector store,
//! and answers questions by retrieving the most similar chunks and asking a
//! chat-completion model to synthesize an answer grounded in them.
//!
//! The pipeline is a composition of four seams, each behind a trait so the
//! shells and the tests can swap implementations:
//!
//! - [`Chunker`] — [`CharWindowChunker`], [`RecursiveChunker`]
//! - [`EmbeddingProvider`] — [`GeminiEmbedder`]
//! - [`VectorStore`] — [`InMemoryVectorStore`], [`ChromaVectorStore`]
//! - [`ChatModel`] — [`GeminiChatModel`], wrapped by [`AnswerSynthesizer`]
//!
//! [`RagPipeline`] wires them together: `index` once at startup, then
//! `answer` per query.

pub mod chat;
pub mod chroma;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gemini;
pub mod inmemory;
pub mod pipeline;
pub mod synthesizer;
pub mod vectorstore;

pub use chat::ChatModel;
pub use chroma::ChromaVectorStore;
pub use chunking::{CharWindowChunker, Chunker, RecursiveChunker};
pub use config::{AppConfig, PipelineConfig, StoreBackend};
pub use document::{Chunk, Document, SearchResult, load_text_file};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use gemini::{GeminiChatModel, GeminiEmbedder};
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use synthesizer::AnswerSynthesizer;
pub use vectorstore::VectorStore;
