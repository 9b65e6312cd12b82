//! HTTP front end for the askdoc RAG service.
//!
//! Routes:
//!
//! - `GET /` — static landing page
//! - `GET /static/*` — static assets
//! - `POST /chat` — `{"message": string}` in, `{"answer": string}` out
//!
//! The pipeline is held in an explicit [`AppState`] injected into handlers;
//! the collection is read-only once startup indexing has finished, so
//! concurrent queries share the state without locking.

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use askdoc_core::{RagError, RagPipeline};

/// Shared server state: the pipeline and the collection it was indexed into.
pub struct AppState {
    /// The fully built, immutable pipeline.
    pub pipeline: Arc<RagPipeline>,
    /// Name of the collection populated at startup.
    pub collection: String,
}

/// A chat query.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's question.
    pub message: String,
}

/// A synthesized answer.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The answer text, verbatim from the model.
    pub answer: String,
}

/// An error response: a status code plus a JSON `{"error": ...}` body.
///
/// Query failures map to 500 and the server keeps serving; only startup
/// failures are fatal.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Build the application router.
///
/// `static_dir` holds the landing page (`index.html`) and the assets served
/// under `/static`.
pub fn app_router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/chat", post(chat))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Answer a chat query: retrieve context, synthesize, return the answer.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("message cannot be empty"));
    }

    let answer = state
        .pipeline
        .answer(&state.collection, message)
        .await
        .inspect_err(|e| error!(error = %e, "query failed"))?;

    info!(message_len = message.len(), answer_len = answer.len(), "answered query");
    Ok(Json(ChatResponse { answer }))
}
