//! Chat orchestration
//!
//! Composes the system prompt with a session's history, relays the provider's
//! fragments to the caller as they arrive, and persists the exchange once the
//! completion finishes.

pub mod orchestrator;
pub mod pending_turn;
pub mod session_store;
pub mod system_prompt;

pub use orchestrator::{ChatOrchestrator, ChatSettings, ReplyStream};
pub use pending_turn::{compose, PendingTurn};
pub use session_store::MemorySessionStore;
pub use system_prompt::DEFAULT_SYSTEM_PROMPT;
