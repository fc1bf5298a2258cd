//! LLM integration for answer generation.
//!
//! Defines the `ChatModel` trait and the OpenRouter-backed
//! implementation that turns (question, context block) into a Korean
//! answer for the farmer.

pub mod openrouter;

use async_trait::async_trait;

/// Everything that can go wrong at the chat-completion boundary. Each
/// variant maps to its own fixed user-facing fallback sentence; none
/// is retried.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("response missing completion text")]
    MalformedResponse,
}

/// Abstraction over the answer-generating model.
///
/// Implementors never surface errors: any failure degrades to a fixed
/// fallback sentence so the HTTP surface always has text to return.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate an answer to `question`, grounded in the assembled
    /// `context` block.
    async fn answer(&self, question: &str, context: &str) -> String;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}
