//! Language-model backend for BidFlow.
//!
//! [`ChatModel`] is the seam the agent pipeline talks to. [`OpenAiProvider`]
//! implements it for any OpenAI-compatible `/chat/completions` endpoint, with
//! bounded retry and exponential backoff for transient failures.

pub mod error;
pub mod openai;
pub mod retry;
pub mod types;

use async_trait::async_trait;

pub use error::LlmError;
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use retry::RetryPolicy;
pub use types::{ChatMessage, ChatRequest, ChatResponse, ChatRole, Usage};

/// A hosted or local chat-completion model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model used when a request leaves `model` empty.
    fn model_id(&self) -> &str;

    /// Submit one completion request and wait for the full reply.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;
}
