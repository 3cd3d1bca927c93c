//! In-band diagnostics.
//!
//! Once a reply has started streaming its status and content type are fixed,
//! so failures are reported as a text fragment carrying a recognisable marker.

/// Marker every diagnostic fragment starts with.
pub const DIAGNOSTIC_PREFIX: &str = "Error: ";

/// Emitted instead of a completion when no provider credential is present.
pub const UNCONFIGURED_DIAGNOSTIC: &str = "Error: GROQ_API_KEY not set";

/// Build a diagnostic fragment for `detail`.
pub fn diagnostic(detail: impl std::fmt::Display) -> String {
    format!("{DIAGNOSTIC_PREFIX}{detail}")
}

/// Whether streamed text is a diagnostic rather than model output.
pub fn is_diagnostic(text: &str) -> bool {
    text.starts_with(DIAGNOSTIC_PREFIX)
}
