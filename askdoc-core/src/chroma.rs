//! Chroma vector store backend.
//!
//! [`ChromaVectorStore`] implements [`VectorStore`] against the Chroma HTTP
//! API (`/api/v1`). Collections are created with the cosine space, and query
//! distances are converted to descending similarity scores.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by a remote [Chroma](https://www.trychroma.com/)
/// server.
///
/// Chroma addresses collections by UUID, so the store keeps a name → id
/// cache populated on first use. All failures to reach the server map to
/// [`RagError::StoreUnavailable`].
pub struct ChromaVectorStore {
    client: reqwest::Client,
    base_url: String,
    collection_ids: RwLock<HashMap<String, String>>,
}

#[derive(Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    metadata: serde_json::Value,
    get_or_create: bool,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    documents: Vec<&'a str>,
    metadatas: Vec<&'a HashMap<String, String>>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<&'a [f32]>,
    n_results: usize,
    include: Vec<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<HashMap<String, serde_json::Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

impl ChromaVectorStore {
    /// Create a new store talking to a Chroma server at `host:port`.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{host}:{port}/api/v1"),
            collection_ids: RwLock::new(HashMap::new()),
        }
    }

    fn store_err(message: impl Into<String>) -> RagError {
        RagError::StoreUnavailable { backend: "chroma".to_string(), message: message.into() }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Self::store_err(format!("server returned {status}: {body}")))
    }

    /// Resolve a collection name to its Chroma id, if the collection exists.
    async fn collection_id(&self, name: &str) -> Result<Option<String>> {
        if let Some(id) = self.collection_ids.read().await.get(name) {
            return Ok(Some(id.clone()));
        }

        let response = self
            .client
            .get(format!("{}/collections/{name}", self.base_url))
            .send()
            .await
            .map_err(|e| Self::store_err(format!("request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        let info: CollectionInfo = response
            .json()
            .await
            .map_err(|e| Self::store_err(format!("failed to parse response: {e}")))?;

        self.collection_ids.write().await.insert(name.to_string(), info.id.clone());
        Ok(Some(info.id))
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    async fn ensure_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let request = CreateCollectionRequest {
            name,
            metadata: serde_json::json!({ "hnsw:space": "cosine" }),
            get_or_create: true,
        };

        let response = self
            .client
            .post(format!("{}/collections", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::store_err(format!("request failed: {e}")))?;
        let response = Self::check_status(response).await?;

        let info: CollectionInfo = response
            .json()
            .await
            .map_err(|e| Self::store_err(format!("failed to parse response: {e}")))?;

        self.collection_ids.write().await.insert(name.to_string(), info.id);
        debug!(collection = name, "ensured chroma collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        self.ensure_collection(collection, 0).await?;
        let id = self
            .collection_id(collection)
            .await?
            .ok_or_else(|| Self::store_err(format!("collection '{collection}' not found")))?;

        let request = AddRequest {
            ids: chunks.iter().map(|c| c.id.as_str()).collect(),
            embeddings: chunks.iter().map(|c| c.embedding.as_slice()).collect(),
            documents: chunks.iter().map(|c| c.text.as_str()).collect(),
            metadatas: chunks.iter().map(|c| &c.metadata).collect(),
        };

        let response = self
            .client
            .post(format!("{}/collections/{id}/add", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::store_err(format!("request failed: {e}")))?;
        Self::check_status(response).await?;

        debug!(collection, count = chunks.len(), "upserted chunks to chroma");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let Some(id) = self.collection_id(collection).await? else {
            return Ok(Vec::new());
        };

        let request = QueryRequest {
            query_embeddings: vec![embedding],
            n_results: top_k,
            include: vec!["documents", "metadatas", "distances"],
        };

        let response = self
            .client
            .post(format!("{}/collections/{id}/query", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::store_err(format!("request failed: {e}")))?;
        let response = Self::check_status(response).await?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| Self::store_err(format!("failed to parse response: {e}")))?;

        let ids = parsed.ids.into_iter().next().unwrap_or_default();
        let documents =
            parsed.documents.and_then(|d| d.into_iter().next()).unwrap_or_default();
        let metadatas =
            parsed.metadatas.and_then(|m| m.into_iter().next()).unwrap_or_default();
        let distances =
            parsed.distances.and_then(|d| d.into_iter().next()).unwrap_or_default();

        let results = ids
            .into_iter()
            .enumerate()
            .map(|(i, chunk_id)| {
                let text = documents.get(i).cloned().flatten().unwrap_or_default();
                let metadata: HashMap<String, String> = metadatas
                    .get(i)
                    .cloned()
                    .flatten()
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|(k, v)| match v {
                        serde_json::Value::String(s) => Some((k, s)),
                        other => Some((k, other.to_string())),
                    })
                    .collect();
                let document_id = metadata.get("document_id").cloned().unwrap_or_else(|| {
                    // Chunk ids are "{document_id}_{index}".
                    chunk_id.rsplit_once('_').map(|(doc, _)| doc.to_string()).unwrap_or_default()
                });

                // Chroma returns cosine distances ascending; flip into a
                // descending similarity score.
                let score = 1.0 - distances.get(i).copied().unwrap_or(1.0);

                SearchResult {
                    chunk: Chunk { id: chunk_id, text, embedding: Vec::new(), metadata, document_id },
                    score,
                }
            })
            .collect();

        Ok(results)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let Some(id) = self.collection_id(collection).await? else {
            return Ok(0);
        };

        let response = self
            .client
            .get(format!("{}/collections/{id}/count", self.base_url))
            .send()
            .await
            .map_err(|e| Self::store_err(format!("request failed: {e}")))?;
        let response = Self::check_status(response).await?;

        response.json().await.map_err(|e| Self::store_err(format!("failed to parse response: {e}")))
    }
}
