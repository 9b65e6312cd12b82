//! askdoc interactive console: index the corpus, then answer questions in a
//! read-eval loop until the user types `exit`.

use std::sync::Arc;

use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;
use tracing_subscriber::EnvFilter;

use askdoc_core::{
    AnswerSynthesizer, AppConfig, ChromaVectorStore, GeminiChatModel, GeminiEmbedder,
    InMemoryVectorStore, RagPipeline, RecursiveChunker, StoreBackend, VectorStore, load_text_file,
};

/// What to do with one line of console input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Leave the loop without touching the pipeline.
    Exit,
    /// Blank input, prompt again.
    Skip,
    /// Answer this question.
    Ask(String),
}

/// Classify a raw input line. `exit` in any casing terminates; whitespace-only
/// input is skipped rather than sent to the pipeline.
fn parse_input(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Command::Skip
    } else if trimmed.eq_ignore_ascii_case("exit") {
        Command::Exit
    } else {
        Command::Ask(trimmed.to_string())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store: Arc<dyn VectorStore> = match config.store {
        StoreBackend::Chroma => {
            Arc::new(ChromaVectorStore::new(&config.chroma_host, config.chroma_port))
        }
        StoreBackend::Memory => Arc::new(InMemoryVectorStore::new()),
    };

    let pipeline = RagPipeline::builder()
        .config(config.pipeline.clone())
        .embedding_provider(Arc::new(GeminiEmbedder::new(&config.api_key)?))
        .vector_store(store)
        .chunker(Arc::new(RecursiveChunker::new(
            config.pipeline.chunk_size,
            config.pipeline.chunk_overlap,
        )?))
        .synthesizer(AnswerSynthesizer::new(Arc::new(GeminiChatModel::new(&config.api_key)?)))
        .build()?;

    let document = load_text_file(&config.document_path)
        .with_context(|| format!("failed to load corpus '{}'", config.document_path))?;
    let chunk_count = pipeline.index(&config.collection, &document).await?;
    info!(chunk_count, collection = %config.collection, "index ready");

    println!("askdoc ready ({} chunks indexed). Type 'exit' to quit.", chunk_count);

    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline("Question: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("failed to read input"),
        };

        match parse_input(&line) {
            Command::Exit => break,
            Command::Skip => continue,
            Command::Ask(question) => {
                editor.add_history_entry(&question)?;
                let answer = pipeline
                    .answer(&config.collection, &question)
                    .await
                    .context("query failed")?;
                println!("Answer: {answer}");
                println!("{}", "-".repeat(60));
            }
        }
    }

    Ok(())
}
