pub mod groq;
pub mod mock;

use std::sync::Arc;

use chatrelay_core::{ChatError, CompletionClient};

/// Build the configured completion client.
///
/// Returns [`ChatError::Unconfigured`] when no credential is present so the
/// caller can degrade instead of attempting a call.
pub fn build_client(
    api_key: Option<&str>,
    base_url: &str,
) -> Result<Arc<dyn CompletionClient>, ChatError> {
    let api_key = api_key.ok_or(ChatError::Unconfigured)?;
    let provider = groq::GroqProvider::new(api_key)?.with_base_url(base_url);
    Ok(Arc::new(provider))
}
