//! End-to-end pipeline tests with deterministic stub providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use askdoc_core::{
    AnswerSynthesizer, ChatModel, Chunker, Document, EmbeddingProvider, InMemoryVectorStore,
    PipelineConfig, RagError, RagPipeline, RecursiveChunker,
};
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Stub providers
// ---------------------------------------------------------------------------

/// Deterministic hash-based embeddings: no API keys, stable across runs.
struct StubEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
}

impl StubEmbedder {
    fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> askdoc_core::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embedder that never completes, for timeout coverage.
struct StalledEmbedder;

#[async_trait]
impl EmbeddingProvider for StalledEmbedder {
    async fn embed(&self, _text: &str) -> askdoc_core::Result<Vec<f32>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![0.0; 8])
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// Chat model returning a canned answer and recording the prompt it saw.
struct StubChatModel {
    answer: String,
    last_prompt: Mutex<Option<String>>,
}

impl StubChatModel {
    fn new(answer: &str) -> Self {
        Self { answer: answer.to_string(), last_prompt: Mutex::new(None) }
    }
}

#[async_trait]
impl ChatModel for StubChatModel {
    async fn complete(&self, prompt: &str) -> askdoc_core::Result<String> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.answer.clone())
    }
}

/// Chat model that always fails.
struct FailingChatModel;

#[async_trait]
impl ChatModel for FailingChatModel {
    async fn complete(&self, _prompt: &str) -> askdoc_core::Result<String> {
        Err(RagError::Chat { provider: "stub".to_string(), message: "boom".to_string() })
    }
}

fn build_pipeline(
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn ChatModel>,
    config: PipelineConfig,
) -> (RagPipeline, Arc<InMemoryVectorStore>) {
    let store = Arc::new(InMemoryVectorStore::new());
    let chunker: Arc<dyn Chunker> =
        Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap).unwrap());

    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(embedder)
        .vector_store(store.clone())
        .chunker(chunker)
        .synthesizer(AnswerSynthesizer::new(model))
        .build()
        .unwrap();

    (pipeline, store)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn answers_question_from_single_chunk_corpus() {
    let model = Arc::new(StubChatModel::new("The capital of France is Paris."));
    let (pipeline, _store) = build_pipeline(
        Arc::new(StubEmbedder::new(32)),
        model.clone(),
        PipelineConfig::default(),
    );

    let document = Document::new("facts", "The capital of France is Paris.");
    let stored = pipeline.index("docs", &document).await.unwrap();
    assert_eq!(stored, 1);

    let context = pipeline.retrieve("docs", "What is the capital of France?").await.unwrap();
    assert!(context.iter().any(|r| r.chunk.text.contains("Paris")));

    let answer = pipeline.answer("docs", "What is the capital of France?").await.unwrap();
    assert!(answer.contains("Paris"));

    // The synthesizer saw the retrieved chunk inside the context block.
    let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("<context>"));
    assert!(prompt.contains("The capital of France is Paris."));
    assert!(prompt.contains("Question: What is the capital of France?"));
}

#[tokio::test]
async fn indexing_empty_document_is_a_noop() {
    let (pipeline, store) = build_pipeline(
        Arc::new(StubEmbedder::new(32)),
        Arc::new(StubChatModel::new("n/a")),
        PipelineConfig::default(),
    );

    let stored = pipeline.index("docs", &Document::new("empty", "")).await.unwrap();
    assert_eq!(stored, 0);
    assert_eq!(askdoc_core::VectorStore::count(&*store, "docs").await.unwrap(), 0);
}

#[tokio::test]
async fn querying_empty_collection_returns_empty_context() {
    let (pipeline, _store) = build_pipeline(
        Arc::new(StubEmbedder::new(32)),
        Arc::new(StubChatModel::new("no idea")),
        PipelineConfig::default(),
    );

    let context = pipeline.retrieve("docs", "anything").await.unwrap();
    assert!(context.is_empty());

    // Synthesis over empty context still produces an answer, not an error.
    let answer = pipeline.answer("docs", "anything").await.unwrap();
    assert_eq!(answer, "no idea");
}

#[tokio::test]
async fn retrieval_is_bounded_by_top_k() {
    let config = PipelineConfig::builder().chunk_size(20).chunk_overlap(0).top_k(3).build().unwrap();
    let (pipeline, _store) = build_pipeline(
        Arc::new(StubEmbedder::new(32)),
        Arc::new(StubChatModel::new("n/a")),
        config,
    );

    let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi";
    pipeline.index("docs", &Document::new("words", text)).await.unwrap();

    let results = pipeline.retrieve("docs", "gamma").await.unwrap();
    assert!(results.len() <= 3);
    for window in results.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}

#[tokio::test]
async fn reindexing_populated_collection_does_not_duplicate() {
    let (pipeline, store) = build_pipeline(
        Arc::new(StubEmbedder::new(32)),
        Arc::new(StubChatModel::new("n/a")),
        PipelineConfig::default(),
    );

    let document = Document::new("facts", "The capital of France is Paris.");
    pipeline.index("docs", &document).await.unwrap();
    let count_after_first = askdoc_core::VectorStore::count(&*store, "docs").await.unwrap();

    let reported = pipeline.index("docs", &document).await.unwrap();
    let count_after_second = askdoc_core::VectorStore::count(&*store, "docs").await.unwrap();

    assert_eq!(count_after_first, count_after_second);
    assert_eq!(reported, count_after_first);
}

#[tokio::test(start_paused = true)]
async fn stalled_remote_call_surfaces_timeout() {
    let config =
        PipelineConfig::builder().request_timeout(Duration::from_millis(100)).build().unwrap();
    let (pipeline, _store) = build_pipeline(
        Arc::new(StalledEmbedder),
        Arc::new(StubChatModel::new("n/a")),
        config,
    );

    let err = pipeline.retrieve("docs", "query").await.unwrap_err();
    assert!(matches!(err, RagError::Timeout { .. }));
}

#[tokio::test]
async fn chat_failure_propagates_unchanged() {
    let (pipeline, _store) = build_pipeline(
        Arc::new(StubEmbedder::new(32)),
        Arc::new(FailingChatModel),
        PipelineConfig::default(),
    );

    pipeline.index("docs", &Document::new("facts", "some facts")).await.unwrap();

    let err = pipeline.answer("docs", "question").await.unwrap_err();
    assert!(matches!(err, RagError::Chat { .. }));
}

#[test]
fn builder_requires_all_components() {
    let err = RagPipeline::builder().config(PipelineConfig::default()).build();
    assert!(matches!(err, Err(RagError::Config(_))));
}
