//! Completion client adapters.
//!
//! Each provider turns a list of turns into a lazy stream of text fragments.

pub mod providers;
pub mod sse;

pub use providers::build_client;
pub use providers::groq::GroqProvider;
pub use providers::mock::MockProvider;
pub use sse::{SseDecoder, SseEvent};
