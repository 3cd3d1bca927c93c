pub mod diagnostic;
pub mod error;
pub mod history;
pub mod traits;
pub mod types;

pub use diagnostic::{diagnostic, is_diagnostic, DIAGNOSTIC_PREFIX, UNCONFIGURED_DIAGNOSTIC};
pub use error::ChatError;
pub use history::{History, MAX_HISTORY_TURNS};
pub use traits::{CompletionClient, CompletionRequest, FragmentStream, SessionStore};
pub use types::{Role, SessionId, Turn};
