//! Session store: keyed persistence of dialog state with expiry on lookup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::Session;
use crate::error::StoreError;

/// Backend-agnostic session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a live session. Unknown and expired ids both yield `None`.
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError>;

    /// Insert or overwrite a session. Last write wins.
    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Drop every expired session. Returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, StoreError>;

    /// Number of stored sessions, expired or not.
    async fn len(&self) -> usize;
}

/// In-memory store backed by a `HashMap` behind an async `RwLock`.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    timeout: Duration,
}

impl InMemorySessionStore {
    pub fn new(timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            timeout,
        })
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(session) if session.is_expired(self.timeout) => {
                debug!(session_id, "Stored session expired, treating as absent");
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(self.timeout, now));
        let removed = before - sessions.len();

        if removed > 0 {
            info!(count = removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Spawn a background task that periodically purges expired sessions.
pub fn spawn_expiry_task(
    store: Arc<dyn SessionStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = store.purge_expired().await {
                tracing::warn!(error = %e, "Session purge failed");
            }
        }
    })
}
