//! Environment variable loading.
//!
//! Blank values count as unset. A value that fails to parse falls back to
//! the default and produces a warning naming the variable.

use std::str::FromStr;

use crate::schema::ChatRelayConfig;
use crate::validation::ConfigValidationError;

pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const GROQ_BASE_URL: &str = "GROQ_BASE_URL";
pub const GROQ_MODEL: &str = "GROQ_MODEL";
pub const TEMPERATURE: &str = "CHATRELAY_TEMPERATURE";
pub const MAX_TOKENS: &str = "CHATRELAY_MAX_TOKENS";
pub const SYSTEM_PROMPT: &str = "CHATRELAY_SYSTEM_PROMPT";
pub const SECRET_KEY: &str = "SECRET_KEY";
pub const SESSION_TTL_SECS: &str = "CHATRELAY_SESSION_TTL_SECS";
pub const BIND: &str = "CHATRELAY_BIND";
pub const PORT: &str = "CHATRELAY_PORT";
pub const LOG_LEVEL: &str = "RUST_LOG";
pub const LOG_FORMAT: &str = "CHATRELAY_LOG_FORMAT";
pub const LOG_DIR: &str = "CHATRELAY_LOG_DIR";

/// Load configuration from the process environment.
pub fn load_from_env() -> (ChatRelayConfig, Vec<ConfigValidationError>) {
    load_from(|name| std::env::var(name).ok())
}

/// Load configuration through `lookup` (useful for testing).
pub fn load_from<F>(lookup: F) -> (ChatRelayConfig, Vec<ConfigValidationError>)
where
    F: Fn(&str) -> Option<String>,
{
    let mut loader = Loader {
        lookup,
        warnings: Vec::new(),
    };
    let mut config = ChatRelayConfig::default();

    config.provider.api_key = loader.string(GROQ_API_KEY);
    if let Some(url) = loader.string(GROQ_BASE_URL) {
        config.provider.base_url = url;
    }
    if let Some(model) = loader.string(GROQ_MODEL) {
        config.provider.model = model;
    }
    loader.parse(TEMPERATURE, &mut config.provider.temperature);
    loader.parse(MAX_TOKENS, &mut config.provider.max_tokens);

    config.chat.system_prompt = loader.string(SYSTEM_PROMPT);

    config.session.secret_key = loader.string(SECRET_KEY);
    loader.parse(SESSION_TTL_SECS, &mut config.session.ttl_secs);

    if let Some(bind) = loader.string(BIND) {
        config.server.bind_address = bind;
    }
    loader.parse(PORT, &mut config.server.port);

    if let Some(level) = loader.string(LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(format) = loader.string(LOG_FORMAT) {
        config.logging.format = format;
    }
    config.logging.dir = loader.string(LOG_DIR);

    (config, loader.warnings)
}

struct Loader<F> {
    lookup: F,
    warnings: Vec<ConfigValidationError>,
}

impl<F> Loader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&mut self, name: &str, target: &mut T)
    where
        T: FromStr + std::fmt::Display,
    {
        let Some(raw) = self.string(name) else { return };
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => self.warnings.push(ConfigValidationError {
                path: name.to_string(),
                message: format!("cannot parse '{raw}'; using default {target}"),
            }),
        }
    }
}
