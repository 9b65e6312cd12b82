//! Chat-completion model trait.

use async_trait::async_trait;

use crate::error::Result;

/// A chat-completion model that turns a prompt into generated text.
///
/// The service needs exactly one call shape: a single user prompt in, the
/// generated answer out. Streaming, tool calls, and conversation history are
/// out of scope.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for the given prompt.
    ///
    /// Returns the model output verbatim; no post-processing.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
