//! Runtime configuration for chatrelay.
//!
//! Provides:
//! - Typed config schema (server, provider, chat, session, logging)
//! - Environment loading with defaults
//! - Validation report
//! - Redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{load_from, load_from_env};
pub use redact::redact;
pub use schema::{
    ChatConfig, ChatRelayConfig, LoggingConfig, ProviderConfig, ServerConfig, SessionConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

/// Load from the process environment and validate.
///
/// Parse problems in individual variables are reported as warnings and the
/// default is used; the caller decides whether errors are fatal.
pub fn load() -> (ChatRelayConfig, ValidationReport) {
    let (config, parse_warnings) = load_from_env();
    let mut report = validate(&config);
    report.warnings.extend(parse_warnings);
    (config, report)
}
