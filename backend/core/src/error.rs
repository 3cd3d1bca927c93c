use thiserror::Error;

/// Top-level error type for the chat relay.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No message provided")]
    EmptyMessage,

    #[error("completion provider is not configured")]
    Unconfigured,

    #[error("LLM provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("session store error: {0}")]
    Session(String),
}

impl ChatError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for failures caused by the request itself rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyMessage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_validation_is_client_error() {
        assert!(ChatError::EmptyMessage.is_client_error());
        assert!(!ChatError::Unconfigured.is_client_error());
        assert!(!ChatError::provider("groq", "boom").is_client_error());
        assert!(!ChatError::Session("down".into()).is_client_error());
    }

    #[test]
    fn provider_error_names_provider() {
        let err = ChatError::provider("groq", "401 Unauthorized");
        assert_eq!(err.to_string(), "LLM provider error (groq): 401 Unauthorized");
    }
}
