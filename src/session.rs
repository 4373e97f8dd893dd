//! In-process session state
//!
//! Holds the auth token and the conversation transcript for the lifetime of
//! the client. All access goes through one [`SessionStore`] handle; clones
//! share the same state.

mod persistence;

pub use persistence::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub sources: Vec<String>,
    /// Position in the append sequence; strictly increasing per store
    pub sent_at: u64,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of session state
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub auth_token: Option<String>,
    pub transcript: Vec<Message>,
    next_seq: u64,
}

/// Shared handle to the session
#[derive(Clone)]
pub struct SessionStore {
    id: Uuid,
    inner: Arc<Mutex<Session>>,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("id", &self.id)
            .field("persistent", &self.token_store.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Fresh, memory-only session
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Arc::new(Mutex::new(Session::default())),
            token_store: None,
        }
    }

    /// Session whose token is mirrored into a durable store.
    ///
    /// A token already present in the store is restored immediately.
    #[must_use]
    pub fn with_token_store(token_store: Arc<dyn TokenStore>) -> Self {
        let restored = match token_store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to restore auth token");
                None
            }
        };

        let store = Self {
            id: Uuid::new_v4(),
            inner: Arc::new(Mutex::new(Session {
                auth_token: restored,
                ..Session::default()
            })),
            token_store: Some(token_store),
        };
        tracing::debug!(
            session_id = %store.id,
            restored = store.get_token().is_some(),
            "Session created"
        );
        store
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        self.lock().auth_token.clone()
    }

    /// Replace the token. No validation is done here.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.lock().auth_token = Some(token.clone());

        if let Some(store) = &self.token_store {
            if let Err(e) = store.save(&token) {
                tracing::warn!(session_id = %self.id, error = %e, "Failed to persist auth token");
            }
        }
    }

    /// Append a message, stamping its sequence number and time
    #[allow(clippy::must_use_candidate)]
    pub fn append_message(
        &self,
        role: Role,
        text: impl Into<String>,
        sources: Vec<String>,
    ) -> Message {
        let mut session = self.lock();
        let message = Message {
            role,
            text: text.into(),
            sources,
            sent_at: session.next_seq,
            created_at: Utc::now(),
        };
        session.next_seq += 1;
        session.transcript.push(message.clone());
        message
    }

    /// Ordered copy of the transcript
    #[must_use]
    pub fn transcript(&self) -> Vec<Message> {
        self.lock().transcript.clone()
    }

    #[must_use]
    pub fn transcript_len(&self) -> usize {
        self.lock().transcript.len()
    }

    /// Drop the transcript but keep the token
    pub fn clear_transcript(&self) {
        self.lock().transcript.clear();
    }

    /// Reset token and transcript (logout)
    pub fn clear(&self) {
        {
            let mut session = self.lock();
            session.auth_token = None;
            session.transcript.clear();
        }

        if let Some(store) = &self.token_store {
            if let Err(e) = store.clear() {
                tracing::warn!(session_id = %self.id, error = %e, "Failed to clear persisted auth token");
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let store = SessionStore::new();
        assert_eq!(store.get_token(), None);
        store.set_token("abc");
        assert_eq!(store.get_token().as_deref(), Some("abc"));
        store.set_token("def");
        assert_eq!(store.get_token().as_deref(), Some("def"));
    }

    #[test]
    fn test_append_keeps_order_and_sequence() {
        let store = SessionStore::new();
        let first = store.append_message(Role::User, "hi", vec![]);
        let second = store.append_message(Role::Assistant, "hello", vec!["Unit 1".into()]);

        let transcript = store.transcript();
        assert_eq!(transcript, vec![first.clone(), second.clone()]);
        assert!(first.sent_at < second.sent_at);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let store = SessionStore::new();
        store.append_message(Role::User, "same", vec![]);
        store.append_message(Role::User, "same", vec![]);
        assert_eq!(store.transcript_len(), 2);
    }

    #[test]
    fn test_clear_resets_token_and_transcript() {
        let store = SessionStore::new();
        store.set_token("abc");
        store.append_message(Role::User, "hi", vec![]);
        store.clear();
        assert_eq!(store.get_token(), None);
        assert!(store.transcript().is_empty());
    }

    #[test]
    fn test_sequence_survives_clear() {
        let store = SessionStore::new();
        let before = store.append_message(Role::User, "one", vec![]);
        store.clear_transcript();
        let after = store.append_message(Role::User, "two", vec![]);
        assert!(after.sent_at > before.sent_at);
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();
        other.set_token("shared");
        other.append_message(Role::User, "hi", vec![]);
        assert_eq!(store.get_token().as_deref(), Some("shared"));
        assert_eq!(store.transcript_len(), 1);
        assert_eq!(store.id(), other.id());
    }

    #[test]
    fn test_token_mirrored_to_durable_store() {
        let durable = Arc::new(MemoryTokenStore::default());
        let store = SessionStore::with_token_store(durable.clone());
        store.set_token("persist-me");
        assert_eq!(durable.load().unwrap().as_deref(), Some("persist-me"));

        let reloaded = SessionStore::with_token_store(durable.clone());
        assert_eq!(reloaded.get_token().as_deref(), Some("persist-me"));

        reloaded.clear();
        assert_eq!(durable.load().unwrap(), None);
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let store = SessionStore::new();
        let msg = store.append_message(Role::Assistant, "answer", vec![]);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["sent_at"], 0);
    }
}
