//! askdoc HTTP server: index the corpus once at startup, then serve queries.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use askdoc_core::{
    AnswerSynthesizer, AppConfig, ChromaVectorStore, GeminiChatModel, GeminiEmbedder,
    InMemoryVectorStore, RagPipeline, RecursiveChunker, StoreBackend, VectorStore, load_text_file,
};
use askdoc_server::{AppState, app_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Missing credential is fatal before anything is served.
    let config = AppConfig::from_env().context("invalid configuration")?;

    let store: Arc<dyn VectorStore> = match config.store {
        StoreBackend::Chroma => {
            Arc::new(ChromaVectorStore::new(&config.chroma_host, config.chroma_port))
        }
        StoreBackend::Memory => Arc::new(InMemoryVectorStore::new()),
    };

    let pipeline = Arc::new(
        RagPipeline::builder()
            .config(config.pipeline.clone())
            .embedding_provider(Arc::new(GeminiEmbedder::new(&config.api_key)?))
            .vector_store(store)
            .chunker(Arc::new(RecursiveChunker::new(
                config.pipeline.chunk_size,
                config.pipeline.chunk_overlap,
            )?))
            .synthesizer(AnswerSynthesizer::new(Arc::new(GeminiChatModel::new(&config.api_key)?)))
            .build()?,
    );

    // Build the index exactly once, before accepting queries.
    info!(document = %config.document_path, collection = %config.collection, "indexing corpus");
    let document = load_text_file(&config.document_path)
        .with_context(|| format!("failed to load corpus '{}'", config.document_path))?;
    let chunk_count = pipeline.index(&config.collection, &document).await?;
    info!(chunk_count, "index ready");

    let state = Arc::new(AppState { pipeline, collection: config.collection.clone() });
    let app = app_router(state, "static");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("askdoc listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
