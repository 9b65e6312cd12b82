//! Gemini providers for embeddings and chat completions.
//!
//! Both providers call the Gemini REST API directly with `reqwest`:
//!
//! - [`GeminiEmbedder`] — `models/{model}:embedContent` and
//!   `:batchEmbedContents`
//! - [`GeminiChatModel`] — `models/{model}:generateContent` with
//!   temperature 0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::chat::ChatModel;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Base URL of the Gemini REST API.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";

/// Dimensionality of `gemini-embedding-001` vectors.
const DEFAULT_DIMENSIONS: usize = 3072;

/// Default chat-completion model.
const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Extract the error message from a Gemini error body, falling back to the
/// raw body text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the Gemini embeddings API.
///
/// # Configuration
///
/// - `model` – defaults to `gemini-embedding-001` (3072 dimensions).
/// - `api_key` – passed to the constructor; the API key is sent in the
///   `x-goog-api-key` header.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
    base_url: String,
}

impl GeminiEmbedder {
    /// Create a new embedder with the given API key and the default model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Config("API key must not be empty".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            base_url: GEMINI_BASE_URL.into(),
        })
    }

    /// Set the embedding model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (for tests or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    content: EmbedContent<'a>,
}

#[derive(Serialize)]
struct BatchEmbedItem<'a> {
    model: String,
    content: EmbedContent<'a>,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<BatchEmbedItem<'a>>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    fn embed_err(message: impl Into<String>) -> RagError {
        RagError::Embedding { provider: "Gemini".into(), message: message.into() }
    }

    async fn post_json<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<reqwest::Response> {
        let url = format!("{}/models/{}:{endpoint}", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Gemini", error = %e, "embedding request failed");
                Self::embed_err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "Gemini", %status, "embedding API error");
            return Err(Self::embed_err(format!("API returned {status}: {}", error_detail(&body))));
        }

        Ok(response)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Gemini", text_len = text.len(), "embedding single text");

        let request = EmbedRequest { content: EmbedContent { parts: vec![TextPart { text }] } };
        let response = self.post_json("embedContent", &request).await?;

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Self::embed_err(format!("failed to parse response: {e}")))?;

        Ok(parsed.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "Gemini", batch_size = texts.len(), model = %self.model, "embedding batch");

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| BatchEmbedItem {
                    model: format!("models/{}", self.model),
                    content: EmbedContent { parts: vec![TextPart { text }] },
                })
                .collect(),
        };
        let response = self.post_json("batchEmbedContents", &request).await?;

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| Self::embed_err(format!("failed to parse response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Self::embed_err(format!(
                "API returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completion ────────────────────────────────────────────────

/// A [`ChatModel`] backed by the Gemini `generateContent` API.
///
/// The generation temperature is pinned to 0 so answers lean deterministic
/// for a fixed prompt and context.
pub struct GeminiChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatModel {
    /// Create a new chat model with the given API key and the default model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Config("API key must not be empty".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_CHAT_MODEL.into(),
            base_url: GEMINI_BASE_URL.into(),
        })
    }

    /// Set the chat model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (for tests or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn chat_err(message: impl Into<String>) -> RagError {
        RagError::Chat { provider: "Gemini".into(), message: message.into() }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(provider = "Gemini", model = %self.model, prompt_len = prompt.len(), "generating answer");

        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Gemini", error = %e, "chat request failed");
                Self::chat_err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "Gemini", %status, "chat API error");
            return Err(Self::chat_err(format!("API returned {status}: {}", error_detail(&body))));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Self::chat_err(format!("failed to parse response: {e}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Self::chat_err("API returned no candidates"))?;

        let text: String =
            candidate.content.parts.into_iter().map(|part| part.text).collect();

        Ok(text)
    }
}
