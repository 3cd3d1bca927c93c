/// Injected ahead of the history on every request; never stored in it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Be concise, friendly, and informative. Answer questions clearly and provide helpful explanations.";
