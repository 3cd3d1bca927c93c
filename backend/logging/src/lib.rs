//! Structured logging for chatrelay.
//!
//! Console output (text or JSON), optional rolling NDJSON file output, and
//! secret scrubbing for anything derived from provider responses.

pub mod logger;
pub mod redact;

pub use logger::{init_logger, LogFormat, LogSettings};
pub use redact::redact_sensitive_data;
