//! chatrelay HTTP gateway
//!
//! Serves the chat page and the chat, clear and health API over axum.

pub mod chat_api;
pub mod control_ui;
pub mod error;
pub mod health_api;
pub mod server;
pub mod session_cookie;

pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState};
pub use session_cookie::{SessionCookie, SessionSigner, SESSION_COOKIE};
