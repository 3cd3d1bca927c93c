//! Config validation with user-friendly error messages.

use crate::schema::ChatRelayConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ChatRelayConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_provider(config, &mut report);
    validate_session(config, &mut report);
    validate_server(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_provider(config: &ChatRelayConfig, report: &mut ValidationReport) {
    let provider = &config.provider;
    if provider.api_key.is_none() {
        report.warn("provider.api_key", "GROQ_API_KEY not set; chat replies will be a diagnostic");
    }
    if provider.base_url.trim().is_empty() {
        report.error("provider.base_url", "Base URL cannot be empty");
    }
    if provider.model.trim().is_empty() {
        report.error("provider.model", "Model cannot be empty");
    }
    if !(0.0..=2.0).contains(&provider.temperature) {
        report.error(
            "provider.temperature",
            format!("Temperature {} is outside 0.0..=2.0", provider.temperature),
        );
    }
    if provider.max_tokens == 0 {
        report.error("provider.max_tokens", "max_tokens must be > 0");
    }
}

fn validate_session(config: &ChatRelayConfig, report: &mut ValidationReport) {
    if config.session.secret_key.is_none() {
        report.warn(
            "session.secret_key",
            "SECRET_KEY not set; sessions will not survive a restart",
        );
    }
    if config.session.ttl_secs == 0 {
        report.error("session.ttl_secs", "Session TTL must be > 0");
    }
}

fn validate_server(config: &ChatRelayConfig, report: &mut ValidationReport) {
    let port = config.server.port;
    if port < 1024 && port != 80 && port != 443 {
        report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }
}

fn validate_logging(config: &ChatRelayConfig, report: &mut ValidationReport) {
    let format = config.logging.format.trim().to_ascii_lowercase();
    if !matches!(format.as_str(), "text" | "pretty" | "json") {
        report.warn(
            "logging.format",
            format!("Unknown log format '{}'; falling back to text", config.logging.format),
        );
    }
}
