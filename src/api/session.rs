//! Session management for the web form

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::rag::ProfileSession;
use crate::rag::RagService;

/// Messages kept per session; older ones are dropped in question/answer pairs
pub const MAX_HISTORY_MESSAGES: usize = 20;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Chat message in conversation history
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One browser session: its own profile session plus the displayed history
#[derive(Clone)]
pub struct WebSession {
    pub session_id: String,
    pub profile: Arc<ProfileSession>,
    pub history: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl WebSession {
    pub fn new(service: Arc<RagService>) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            profile: Arc::new(ProfileSession::new(service)),
            history: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        let timestamp = Utc::now();
        self.history.push(ChatMessage {
            role,
            content: content.into(),
            timestamp,
        });
        self.last_activity = timestamp;

        if self.history.len() > MAX_HISTORY_MESSAGES {
            let excess = self.history.len() - MAX_HISTORY_MESSAGES;
            self.history.drain(0..excess);
        }
    }

    pub fn is_expired(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        let idle = now.signed_duration_since(self.last_activity);
        idle.to_std().is_ok_and(|idle| idle > timeout)
    }
}

/// Session store keyed by session id, with idle expiry
pub struct SessionManager {
    sessions: Arc<DashMap<String, WebSession>>,
    session_timeout: Duration,
    service: Arc<RagService>,
}

impl SessionManager {
    pub fn new(service: Arc<RagService>, session_timeout_secs: u64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            session_timeout: Duration::from_secs(session_timeout_secs),
            service,
        }
    }

    /// Start the background sweep of expired sessions
    pub fn spawn_cleanup(&self) -> JoinHandle<()> {
        let sessions = self.sessions.clone();
        let timeout = self.session_timeout;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                Self::cleanup_expired_sessions(&sessions, timeout);
            }
        })
    }

    pub fn create_session(&self) -> WebSession {
        let session = WebSession::new(self.service.clone());
        self.sessions
            .insert(session.session_id.clone(), session.clone());
        session
    }

    /// Live session by id; expired sessions are removed and reported as missing
    pub fn get_session(&self, session_id: &str) -> Option<WebSession> {
        {
            let mut entry = self.sessions.get_mut(session_id)?;
            let now = Utc::now();
            if !entry.is_expired(self.session_timeout, now) {
                entry.last_activity = now;
                return Some(entry.clone());
            }
        }

        self.sessions.remove(session_id);
        tracing::info!("Session {} expired", session_id);
        None
    }

    /// Append a question and its answer (or error text) to the history
    pub fn record_exchange(&self, session_id: &str, question: &str, answer: &str) -> Option<WebSession> {
        let mut entry = self.sessions.get_mut(session_id)?;
        entry.add_message(Role::User, question);
        entry.add_message(Role::Assistant, answer);
        Some(entry.clone())
    }

    pub fn delete_session(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Remove every expired session now; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        Self::cleanup_expired_sessions(&self.sessions, self.session_timeout)
    }

    fn cleanup_expired_sessions(sessions: &DashMap<String, WebSession>, timeout: Duration) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|entry| entry.value().is_expired(timeout, now))
            .map(|entry| entry.key().clone())
            .collect();

        for session_id in &expired {
            sessions.remove(session_id);
            tracing::info!("Cleaned up expired session: {}", session_id);
        }
        expired.len()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, session_id: &str, by: chrono::Duration) {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.last_activity -= by;
        }
    }
}
