use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};

use chatrelay_core::{ChatError, CompletionClient, CompletionRequest, FragmentStream};

/// A scripted provider for tests and local development.
pub struct MockProvider {
    name: String,
    fragments: Vec<String>,
    fail_after: Option<(usize, String)>,
    fail_on_open: Option<String>,
    stall_on_open: bool,
    hang_at_end: bool,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
    stream_dropped: Arc<AtomicBool>,
    open_abandoned: Arc<AtomicBool>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fragments: vec!["Mock response".to_string()],
            fail_after: None,
            fail_on_open: None,
            stall_on_open: false,
            hang_at_end: false,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            stream_dropped: Arc::new(AtomicBool::new(false)),
            open_abandoned: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments = fragments.into_iter().map(Into::into).collect();
        self
    }

    /// Emit the first `count` fragments, then fail with `message`.
    pub fn failing_after(mut self, count: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((count, message.into()));
        self
    }

    /// Fail before any fragment is produced.
    pub fn failing_on_open(mut self, message: impl Into<String>) -> Self {
        self.fail_on_open = Some(message.into());
        self
    }

    /// Never finish opening the stream.
    pub fn stalling_on_open(mut self) -> Self {
        self.stall_on_open = true;
        self
    }

    /// Never terminate after the scripted fragments.
    pub fn hanging(mut self) -> Self {
        self.hang_at_end = true;
        self
    }

    /// Number of `stream` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }

    /// Whether the most recent stream has been dropped by its consumer.
    pub fn stream_dropped(&self) -> bool {
        self.stream_dropped.load(Ordering::SeqCst)
    }

    /// Whether a stalled `stream` call was cancelled by its caller.
    pub fn open_abandoned(&self) -> bool {
        self.open_abandoned.load(Ordering::SeqCst)
    }
}

/// Flips a flag when the owning stream is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct Guarded {
    inner: FragmentStream,
    _flag: DropFlag,
}

impl Stream for Guarded {
    type Item = Result<String, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[async_trait]
impl CompletionClient for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if let Some(message) = &self.fail_on_open {
            return Err(ChatError::provider(&self.name, message.clone()));
        }

        if self.stall_on_open {
            let _flag = DropFlag(Arc::clone(&self.open_abandoned));
            futures::future::pending::<()>().await;
        }

        let items: Vec<Result<String, ChatError>> = match &self.fail_after {
            Some((count, message)) => {
                let mut items: Vec<_> =
                    self.fragments.iter().take(*count).cloned().map(Ok).collect();
                items.push(Err(ChatError::provider(&self.name, message.clone())));
                items
            }
            None => self.fragments.iter().cloned().map(Ok).collect(),
        };

        let scripted = stream::iter(items);

        let tail: BoxStream<'static, Result<String, ChatError>> = if self.hang_at_end {
            stream::pending().boxed()
        } else {
            stream::empty().boxed()
        };

        self.stream_dropped.store(false, Ordering::SeqCst);
        Ok(Box::pin(Guarded {
            inner: Box::pin(scripted.chain(tail)),
            _flag: DropFlag(Arc::clone(&self.stream_dropped)),
        }))
    }
}
