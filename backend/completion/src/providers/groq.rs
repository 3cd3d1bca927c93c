use std::collections::VecDeque;

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chatrelay_core::{ChatError, CompletionClient, CompletionRequest, FragmentStream, Turn};

use crate::sse::{SseDecoder, SseEvent};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

const PROVIDER: &str = "groq";

/// Groq chat-completions provider (OpenAI-compatible streaming API).
pub struct GroqProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqProvider {
    /// Fails with [`ChatError::Unconfigured`] when the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ChatError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ChatError::Unconfigured);
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
    max_completion_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

/// Extract the text delta from one `data:` payload.
fn parse_chunk(data: &str) -> Result<Option<String>, ChatError> {
    let chunk: ChunkResponse = serde_json::from_str(data)
        .map_err(|e| ChatError::Stream(format!("malformed completion chunk: {e}")))?;

    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ChatError::provider(PROVIDER, message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

struct RelayState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, ChatError>>,
    finished: bool,
}

impl<S> RelayState<S> {
    fn accept(&mut self, events: impl IntoIterator<Item = SseEvent>) {
        for event in events {
            if self.finished {
                break;
            }
            match event {
                SseEvent::Done => self.finished = true,
                SseEvent::Data(data) => match parse_chunk(&data) {
                    Ok(Some(text)) => self.pending.push_back(Ok(text)),
                    Ok(None) => {}
                    Err(e) => {
                        self.pending.push_back(Err(e));
                        self.finished = true;
                    }
                },
            }
        }
    }
}

/// Turn a raw SSE byte stream into text fragments, one per non-empty delta.
fn fragments<S, B>(body: S) -> impl Stream<Item = Result<String, ChatError>> + Send
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin + Send,
    B: AsRef<[u8]> + Send,
{
    let state = RelayState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.accept(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state.pending.push_back(Err(ChatError::Stream(e.to_string())));
                }
                None => {
                    let tail = state.decoder.finish();
                    state.accept(tail);
                    state.finished = true;
                }
            }
        }
    })
}

#[async_trait]
impl CompletionClient for GroqProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, ChatError> {
        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_completion_tokens: request.max_tokens,
            stream: true,
        };

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending streamed request to Groq"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::provider(PROVIDER, format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ChatError::provider(
                PROVIDER,
                format!("Groq returned {status}: {error_body}"),
            ));
        }

        Ok(Box::pin(fragments(Box::pin(response.bytes_stream()))))
    }
}
