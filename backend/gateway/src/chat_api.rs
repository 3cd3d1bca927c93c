//! Chat and clear endpoints.
//!
//! `POST /api/chat` takes `{"message": "..."}` and streams the reply as
//! `text/plain` chunks. Failures after the stream starts arrive in-band as
//! text beginning with `Error: `; only validation and setup failures get a
//! JSON error status.

use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderName, HeaderValue,
    },
    response::Response,
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use chatrelay_chat::ReplyStream;

use crate::error::ApiError;
use crate::server::GatewayState;
use crate::session_cookie::SessionCookie;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

#[derive(Debug, Default, Deserialize)]
struct ChatPayload {
    #[serde(default)]
    message: Option<String>,
}

fn parse_payload(body: &[u8]) -> Result<ChatPayload, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ChatPayload::default());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?;
    if !value.is_object() {
        return Err(ApiError::BadRequest("JSON body must be an object".to_string()));
    }
    serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

fn stream_response(reply: ReplyStream) -> Response {
    let mut response = Response::new(Body::from_stream(reply.map(Ok::<_, Infallible>)));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    response
}

async fn start_reply(
    state: &GatewayState,
    session: &SessionCookie,
    body: &[u8],
) -> Result<Response, ApiError> {
    let message = parse_payload(body)?.message.unwrap_or_default();
    match state.orchestrator.chat(&session.id, &message).await {
        Ok(reply) => Ok(stream_response(reply)),
        Err(e) if e.is_client_error() => {
            warn!(session = %session.id, "Rejected chat request: {}", e);
            Err(e.into())
        }
        Err(e) => {
            error!(session = %session.id, "Chat request failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handler for `POST /api/chat`
pub async fn chat(
    State(state): State<GatewayState>,
    session: SessionCookie,
    body: Bytes,
) -> (SessionCookie, Result<Response, ApiError>) {
    let result = start_reply(&state, &session, &body).await;
    (session, result)
}

/// Handler for `POST /api/clear`
pub async fn clear(
    State(state): State<GatewayState>,
    session: SessionCookie,
) -> (SessionCookie, Json<Value>) {
    state.orchestrator.clear(&session.id).await;
    (session, Json(json!({ "status": "cleared" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_means_missing_message() {
        assert!(parse_payload(b"").unwrap().message.is_none());
        assert!(parse_payload(b" \n").unwrap().message.is_none());
        assert!(parse_payload(b"{}").unwrap().message.is_none());
        assert!(parse_payload(br#"{"message":null}"#).unwrap().message.is_none());
    }

    #[test]
    fn reads_message_field() {
        let payload = parse_payload(br#"{"message":"hi","extra":1}"#).unwrap();
        assert_eq!(payload.message.as_deref(), Some("hi"));
    }

    #[test]
    fn malformed_json_is_a_bad_request() {
        assert!(matches!(parse_payload(b"{oops"), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            parse_payload(br#"{"message":5}"#),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(parse_payload(br#"["hi"]"#), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_payload(br#""hi""#), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_payload(b"null"), Err(ApiError::BadRequest(_))));
    }
}
