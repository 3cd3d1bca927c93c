use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChatError;
use crate::history::History;
use crate::types::{SessionId, Turn};

/// Lazy, finite, non-restartable sequence of completion text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// Request to a completion provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    /// System prompt first, then the conversation, newest last.
    pub messages: Vec<Turn>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Adapter around an external LLM completion API.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Provider name (e.g., "groq").
    fn name(&self) -> &str;

    /// Start a streamed completion. Concatenating every `Ok` fragment yields
    /// the full completion text.
    async fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, ChatError>;
}

/// Per-session history persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored history, or an empty one if the session has none.
    async fn get(&self, session: &SessionId) -> Result<History, ChatError>;

    /// Replace the stored history.
    async fn set(&self, session: &SessionId, history: History) -> Result<(), ChatError>;

    /// Reset the stored history to empty.
    async fn clear(&self, session: &SessionId) -> Result<(), ChatError>;
}
