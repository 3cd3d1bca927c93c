//! Chat page served at `/`.

use axum::{extract::State, response::Html};

use chatrelay_core::DIAGNOSTIC_PREFIX;

use crate::server::GatewayState;

const PAGE: &str = include_str!("../assets/index.html");
const WARNING_SLOT: &str = "<!--API_KEY_WARNING-->";
const PREFIX_SLOT: &str = "__DIAGNOSTIC_PREFIX__";
const WARNING_BANNER: &str = r#"<div class="warning">GROQ_API_KEY is not set. Replies will be an error until the server is restarted with a key.</div>"#;

pub fn render_page(api_key_set: bool) -> String {
    let banner = if api_key_set { "" } else { WARNING_BANNER };
    PAGE.replace(WARNING_SLOT, banner).replace(PREFIX_SLOT, DIAGNOSTIC_PREFIX)
}

/// Handler for `GET /`
pub async fn index(State(state): State<GatewayState>) -> Html<String> {
    Html(render_page(state.orchestrator.is_configured()))
}
