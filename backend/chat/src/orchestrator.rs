//! Chat orchestrator.
//!
//! Each call to [`ChatOrchestrator::chat`] spawns a relay task that pulls
//! fragments from the completion client and pushes them into a bounded
//! channel. The caller consumes the receiving end, so backpressure comes from
//! however fast the caller drains it.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, instrument, warn, Instrument};

use chatrelay_core::{
    diagnostic, ChatError, CompletionClient, CompletionRequest, History, SessionId, SessionStore,
    UNCONFIGURED_DIAGNOSTIC,
};
use chatrelay_logging::redact_sensitive_data;

use crate::pending_turn::PendingTurn;
use crate::system_prompt::DEFAULT_SYSTEM_PROMPT;

/// Fragments of one reply, in emission order.
pub type ReplyStream = ReceiverStream<String>;

/// Static generation parameters and prompt.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Fragments buffered between the relay task and the caller.
    pub relay_buffer: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            relay_buffer: 32,
        }
    }
}

pub struct ChatOrchestrator {
    client: Option<Arc<dyn CompletionClient>>,
    store: Arc<dyn SessionStore>,
    settings: ChatSettings,
}

impl ChatOrchestrator {
    /// `client` is `None` when no provider credential is configured.
    pub fn new(
        client: Option<Arc<dyn CompletionClient>>,
        store: Arc<dyn SessionStore>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            client,
            store,
            settings,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Start a reply to `message` for `session`.
    ///
    /// Only validation can fail here; provider failures arrive in-band as a
    /// diagnostic fragment at the end of the returned stream.
    #[instrument(skip(self, session, message), fields(session = %session))]
    pub async fn chat(&self, session: &SessionId, message: &str) -> Result<ReplyStream, ChatError> {
        let message = PendingTurn::validate(message)?;

        let Some(client) = self.client.clone() else {
            warn!("Completion provider not configured; replying with diagnostic");
            return Ok(single_fragment(UNCONFIGURED_DIAGNOSTIC));
        };

        let history = self.load(session).await;
        let pending = PendingTurn::prepare(history, message, &self.settings.system_prompt)?;
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: pending.messages().to_vec(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let (tx, rx) = mpsc::channel(self.settings.relay_buffer.max(1));
        let relay = Relay {
            client,
            store: Arc::clone(&self.store),
            session: session.clone(),
            pending,
            tx,
        };
        tokio::spawn(relay.run(request).in_current_span());

        Ok(ReceiverStream::new(rx))
    }

    /// Reset the session's history. Never fails; store errors are logged.
    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn clear(&self, session: &SessionId) {
        match self.store.clear(session).await {
            Ok(()) => info!("Session history cleared"),
            Err(e) => warn!(error = %e, "Failed to clear session history"),
        }
    }

    /// Current history for `session`, empty if the store is unavailable.
    pub async fn history(&self, session: &SessionId) -> History {
        self.load(session).await
    }

    async fn load(&self, session: &SessionId) -> History {
        match self.store.get(session).await {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Session store unavailable; continuing with empty history");
                History::new()
            }
        }
    }
}

fn single_fragment(text: &str) -> ReplyStream {
    let (tx, rx) = mpsc::channel(1);
    // Capacity 1 and a fresh channel: this cannot fail.
    let _ = tx.try_send(text.to_string());
    ReceiverStream::new(rx)
}

/// Background task relaying one completion to one caller.
struct Relay {
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn SessionStore>,
    session: SessionId,
    pending: PendingTurn,
    tx: mpsc::Sender<String>,
}

impl Relay {
    async fn run(self, request: CompletionRequest) {
        let Relay {
            client,
            store,
            session,
            pending,
            tx,
        } = self;

        let opened = tokio::select! {
            _ = tx.closed() => {
                info!("Client disconnected while opening completion");
                return;
            }
            opened = client.stream(&request) => opened,
        };

        let mut upstream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                report_failure(&tx, &e).await;
                return;
            }
        };

        let mut full_response = String::new();
        let mut fragments = 0usize;
        loop {
            let item = tokio::select! {
                _ = tx.closed() => {
                    info!(fragments, "Client disconnected; abandoning completion");
                    return;
                }
                item = upstream.next() => item,
            };

            match item {
                Some(Ok(fragment)) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    full_response.push_str(&fragment);
                    fragments += 1;
                    if tx.send(fragment).await.is_err() {
                        info!(fragments, "Client disconnected; abandoning completion");
                        return;
                    }
                }
                Some(Err(e)) => {
                    report_failure(&tx, &e).await;
                    return;
                }
                None => break,
            }
        }

        let history = pending.complete(full_response);
        debug!(fragments, turns = history.len(), "Completion finished");
        if let Err(e) = store.set(&session, history).await {
            error!(error = %e, "Failed to persist session history");
        }

        // The caller sees end-of-stream only after the history is stored.
        drop(tx);
    }
}

/// End the reply with a diagnostic; the partial assistant turn is discarded.
async fn report_failure(tx: &mpsc::Sender<String>, err: &ChatError) {
    let detail = redact_sensitive_data(&err.to_string());
    warn!(error = %detail, "Completion failed; ending reply with diagnostic");
    let _ = tx.send(diagnostic(detail)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use chatrelay_completion::MockProvider;
    use chatrelay_core::{is_diagnostic, Role, Turn};

    use crate::session_store::MemorySessionStore;

    struct UnavailableStore;

    #[async_trait]
    impl SessionStore for UnavailableStore {
        async fn get(&self, _session: &SessionId) -> Result<History, ChatError> {
            Err(ChatError::Session("backend down".into()))
        }
        async fn set(&self, _session: &SessionId, _history: History) -> Result<(), ChatError> {
            Err(ChatError::Session("backend down".into()))
        }
        async fn clear(&self, _session: &SessionId) -> Result<(), ChatError> {
            Err(ChatError::Session("backend down".into()))
        }
    }

    fn orchestrator(
        provider: Option<Arc<MockProvider>>,
    ) -> (ChatOrchestrator, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::default());
        let client = provider.map(|p| p as Arc<dyn CompletionClient>);
        let orchestrator = ChatOrchestrator::new(client, store.clone(), ChatSettings::default());
        (orchestrator, store)
    }

    async fn collect(stream: ReplyStream) -> Vec<String> {
        stream.collect().await
    }

    #[tokio::test]
    async fn hello_on_fresh_session() {
        let provider = Arc::new(MockProvider::new("mock").with_fragments(["Hi", " there", "!"]));
        let (orchestrator, store) = orchestrator(Some(provider.clone()));
        let session = SessionId::new("s1");

        let fragments = collect(orchestrator.chat(&session, "Hello").await.unwrap()).await;
        assert_eq!(fragments, ["Hi", " there", "!"]);

        let history = store.get(&session).await.unwrap();
        assert_eq!(
            history.turns(),
            &[Turn::user("Hello"), Turn::assistant(fragments.concat())]
        );

        let request = provider.last_request().unwrap();
        assert_eq!(request.messages[0].role(), Role::System);
        assert_eq!(request.messages[0].content(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(request.messages[1], Turn::user("Hello"));
        assert_eq!(request.max_tokens, 2048);
    }

    #[tokio::test]
    async fn eleven_exchanges_keep_last_ten_turns() {
        let provider = Arc::new(MockProvider::new("mock").with_fragments(["ok"]));
        let (orchestrator, store) = orchestrator(Some(provider.clone()));
        let session = SessionId::new("s1");

        for i in 0..11 {
            let reply = orchestrator.chat(&session, &format!("q{i}")).await.unwrap();
            collect(reply).await;
            assert!(store.get(&session).await.unwrap().len() <= 10);
        }

        let history = store.get(&session).await.unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history.turns()[0], Turn::user("q6"));
        assert_eq!(history.turns()[8], Turn::user("q10"));
        assert_eq!(history.turns()[9], Turn::assistant("ok"));

        // System prompt plus the truncated history, never more.
        assert_eq!(provider.last_request().unwrap().messages.len(), 11);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_side_effects() {
        let provider = Arc::new(MockProvider::new("mock"));
        let (orchestrator, store) = orchestrator(Some(provider.clone()));
        let session = SessionId::new("s1");

        let err = orchestrator.chat(&session, "").await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(provider.calls(), 0);
        assert!(store.get(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_yields_diagnostic_only() {
        let (orchestrator, store) = orchestrator(None);
        let session = SessionId::new("s1");
        assert!(!orchestrator.is_configured());

        let fragments = collect(orchestrator.chat(&session, "Hello").await.unwrap()).await;
        assert_eq!(fragments, [UNCONFIGURED_DIAGNOSTIC]);
        assert!(store.get(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mid_stream_failure_discards_partial_reply() {
        let provider = Arc::new(
            MockProvider::new("mock")
                .with_fragments(["Hel", "lo"])
                .failing_after(1, "connection reset"),
        );
        let (orchestrator, store) = orchestrator(Some(provider));
        let session = SessionId::new("s1");

        let fragments = collect(orchestrator.chat(&session, "Hello").await.unwrap()).await;
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], "Hel");
        assert!(is_diagnostic(&fragments[1]));
        assert!(fragments[1].contains("connection reset"));
        assert!(store.get(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_to_open_stream_is_in_band() {
        let provider = Arc::new(
            MockProvider::new("mock").failing_on_open("Invalid key gsk_abcdefghijklmnopqrstuvwx"),
        );
        let (orchestrator, store) = orchestrator(Some(provider));
        let session = SessionId::new("s1");

        let fragments = collect(orchestrator.chat(&session, "Hello").await.unwrap()).await;
        assert_eq!(fragments.len(), 1);
        assert!(is_diagnostic(&fragments[0]));
        assert!(!fragments[0].contains("gsk_abcdefghijklmnopqrstuvwx"));
        assert!(store.get(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unavailable_store_degrades_to_empty_history() {
        let provider = Arc::new(MockProvider::new("mock").with_fragments(["fine"]));
        let client: Arc<dyn CompletionClient> = provider.clone();
        let orchestrator = ChatOrchestrator::new(
            Some(client),
            Arc::new(UnavailableStore),
            ChatSettings::default(),
        );
        let session = SessionId::new("s1");

        let fragments = collect(orchestrator.chat(&session, "Hello").await.unwrap()).await;
        assert_eq!(fragments, ["fine"]);
        assert_eq!(provider.last_request().unwrap().messages.len(), 2);

        orchestrator.clear(&session).await;
        assert!(orchestrator.history(&session).await.is_empty());
    }

    #[tokio::test]
    async fn clear_resets_history() {
        let provider = Arc::new(MockProvider::new("mock").with_fragments(["ok"]));
        let (orchestrator, _store) = orchestrator(Some(provider));
        let session = SessionId::new("s1");

        orchestrator.clear(&session).await;
        collect(orchestrator.chat(&session, "Hello").await.unwrap()).await;
        assert_eq!(orchestrator.history(&session).await.len(), 2);

        orchestrator.clear(&session).await;
        assert!(orchestrator.history(&session).await.is_empty());
    }

    #[tokio::test]
    async fn disconnect_stops_relay_without_persisting() {
        let provider = Arc::new(
            MockProvider::new("mock")
                .with_fragments(["first", "second"])
                .hanging(),
        );
        let (orchestrator, store) = orchestrator(Some(provider.clone()));
        let session = SessionId::new("s1");

        let mut reply = orchestrator.chat(&session, "Hello").await.unwrap();
        assert_eq!(reply.next().await.as_deref(), Some("first"));
        drop(reply);

        let mut waited = Duration::ZERO;
        while !provider.stream_dropped() && waited < Duration::from_secs(2) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }
        assert!(provider.stream_dropped());
        assert!(store.get(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disconnect_while_opening_cancels_provider_call() {
        let provider = Arc::new(MockProvider::new("mock").stalling_on_open());
        let (orchestrator, store) = orchestrator(Some(provider.clone()));
        let session = SessionId::new("s1");

        let reply = orchestrator.chat(&session, "Hello").await.unwrap();
        drop(reply);

        let mut waited = Duration::ZERO;
        while !provider.open_abandoned() && waited < Duration::from_secs(2) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }
        assert!(provider.open_abandoned());
        assert_eq!(provider.calls(), 1);
        assert!(store.get(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sessions_do_not_share_history() {
        let provider = Arc::new(MockProvider::new("mock").with_fragments(["ok"]));
        let (orchestrator, store) = orchestrator(Some(provider));
        let alice = SessionId::new("alice");
        let bob = SessionId::new("bob");

        collect(orchestrator.chat(&alice, "from alice").await.unwrap()).await;
        assert_eq!(store.get(&alice).await.unwrap().len(), 2);
        assert!(store.get(&bob).await.unwrap().is_empty());
    }
}
