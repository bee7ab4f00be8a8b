use std::{collections::HashMap, sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Duration, Utc};
use shared::{
    domain::SessionId,
    error::{ApiError, ErrorCode},
};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
};
use tracing::info;
use wizard::{LetterFraming, QuestionSet, SessionState};

#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_ttl: Duration,
}

pub struct SessionEntry {
    pub state: SessionState,
    last_seen: DateTime<Utc>,
}

/// In-memory sessions, one lock per session so walkthroughs never contend.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Mutex<SessionEntry>>>>>,
    questions: QuestionSet,
    framing: LetterFraming,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn new(questions: QuestionSet, framing: LetterFraming, limits: SessionLimits) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            questions,
            framing,
            limits,
        }
    }

    pub async fn create(&self) -> Result<SessionId, ApiError> {
        let now = Utc::now();
        if self.len().await >= self.limits.max_sessions {
            self.purge_expired(now).await;
        }

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.limits.max_sessions {
            return Err(ApiError::new(
                ErrorCode::RateLimited,
                "too many active sessions, try again later",
            ));
        }
        let id = SessionId::new();
        let entry = SessionEntry {
            state: SessionState::new(self.questions.clone(), self.framing.clone()),
            last_seen: now,
        };
        sessions.insert(id, Arc::new(Mutex::new(entry)));
        Ok(id)
    }

    /// Runs `f` against the session while holding its lock.
    pub async fn with_session<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut SessionState) -> T,
    ) -> Result<T, ApiError> {
        let entry = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "session not found"))?;
        let mut entry = entry.lock().await;
        entry.last_seen = Utc::now();
        Ok(f(&mut entry.state))
    }

    pub async fn remove(&self, id: SessionId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle longer than the TTL. Sessions locked right now are in use and kept.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.limits.idle_ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(entry) => entry.last_seen >= cutoff,
            Err(_) => true,
        });
        before - sessions.len()
    }

    pub fn spawn_sweeper(&self, every: StdDuration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = store.purge_expired(Utc::now()).await;
                if purged > 0 {
                    let remaining = store.len().await;
                    info!(purged, remaining, "expired idle sessions");
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/sessions_tests.rs"]
mod tests;
