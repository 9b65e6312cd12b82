//! Answer synthesis from retrieved context.

use std::sync::Arc;

use tracing::debug;

use crate::chat::ChatModel;
use crate::document::SearchResult;
use crate::error::Result;

/// Formats retrieved chunks and the question into a grounded prompt and asks
/// a [`ChatModel`] to synthesize the answer.
///
/// The model output is returned verbatim: no post-processing, no citation
/// extraction, no length capping.
pub struct AnswerSynthesizer {
    model: Arc<dyn ChatModel>,
}

impl AnswerSynthesizer {
    /// Create a synthesizer around the given chat model.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Build the fixed prompt: context block followed by the question.
    pub fn build_prompt(query: &str, context: &[SearchResult]) -> String {
        let context_block = context
            .iter()
            .map(|result| result.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "Please answer the following question using the given context:\n\n\
             <context>\n{context_block}\n</context>\n\n\
             Question: {query}"
        )
    }

    /// Synthesize an answer for `query` grounded in `context`.
    ///
    /// # Errors
    ///
    /// Propagates the chat model's error unchanged; no retries.
    pub async fn synthesize(&self, query: &str, context: &[SearchResult]) -> Result<String> {
        let prompt = Self::build_prompt(query, context);
        debug!(context_chunks = context.len(), prompt_len = prompt.len(), "synthesizing answer");
        self.model.complete(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;
    use std::collections::HashMap;

    fn result(text: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: "doc_0".to_string(),
                text: text.to_string(),
                embedding: Vec::new(),
                metadata: HashMap::new(),
                document_id: "doc".to_string(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn prompt_contains_context_and_question() {
        let prompt = AnswerSynthesizer::build_prompt(
            "What is the capital of France?",
            &[result("The capital of France is Paris.")],
        );

        assert!(prompt.contains("<context>\nThe capital of France is Paris.\n</context>"));
        assert!(prompt.ends_with("Question: What is the capital of France?"));
    }

    #[test]
    fn prompt_separates_chunks_with_blank_lines() {
        let prompt =
            AnswerSynthesizer::build_prompt("q", &[result("first"), result("second")]);
        assert!(prompt.contains("first\n\nsecond"));
    }

    #[test]
    fn empty_context_yields_empty_block() {
        let prompt = AnswerSynthesizer::build_prompt("q", &[]);
        assert!(prompt.contains("<context>\n\n</context>"));
    }
}
