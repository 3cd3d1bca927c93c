//! Runtime configuration schema.

use std::path::PathBuf;
use std::time::Duration;

use chatrelay_logging::{LogFormat, LogSettings};
use serde::{Deserialize, Serialize};

use crate::defaults::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRelayConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub chat: ChatConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl ChatRelayConfig {
    /// Whether a completion credential is present.
    pub fn api_key_set(&self) -> bool {
        self.provider.api_key.is_some()
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.logging.level.clone(),
            format: self.logging.format.parse().unwrap_or(LogFormat::Text),
            log_dir: self.logging.dir.as_ref().map(PathBuf::from),
        }
    }
}

/// HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Completion provider and static generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// `None` when the credential is unset or blank.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Replaces the built-in system prompt when set.
    pub system_prompt: Option<String>,
}

/// Session cookie signing and server-side expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie signing secret; a random per-process key is used when unset.
    pub secret_key: Option<String>,
    pub ttl_secs: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: DEFAULT_LOG_FORMAT.to_string(),
            dir: None,
        }
    }
}
