//! Server-side, process-lifetime session history store.

use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;

use chatrelay_core::{ChatError, History, SessionId, SessionStore};

const DEFAULT_TTL: Duration = Duration::from_secs(86_400);
const MAX_SESSIONS: u64 = 10_000;

/// Histories keyed by session id, dropped after `ttl` without access.
pub struct MemorySessionStore {
    cache: Cache<SessionId, History>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(ttl)
                .build(),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session: &SessionId) -> Result<History, ChatError> {
        Ok(self.cache.get(session).unwrap_or_default())
    }

    async fn set(&self, session: &SessionId, history: History) -> Result<(), ChatError> {
        self.cache.insert(session.clone(), history);
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<(), ChatError> {
        self.cache.invalidate(session);
        Ok(())
    }
}
