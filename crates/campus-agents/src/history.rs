//! Conversation history - bounded, per-session
//!
//! History is per-session state owned by the caller, never process-global.
//! Each session's history sits behind its own async mutex which the caller
//! holds for the whole turn: single writer per session, reads and appends
//! inside one exclusion scope.

use campus_llm::{Message, MessageRole};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Maximum retained history entries (10 user/assistant turns)
pub const DEFAULT_HISTORY_CAP: usize = 20;

/// Session key used when the caller does not supply one
pub const DEFAULT_SESSION: &str = "default";

/// One history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// user or assistant
    pub role: MessageRole,
    /// Entry text
    pub content: String,
}

/// Ordered conversation history, bounded to a fixed cap.
///
/// Entries are appended in production order; role alternation is not
/// enforced. Once the cap is exceeded the oldest entries are dropped.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: Vec<HistoryEntry>,
    cap: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationHistory {
    /// Create an empty history with the default cap
    #[must_use]
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }

    /// Create an empty history with a custom cap
    #[must_use]
    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            cap,
        }
    }

    /// Append one entry, then truncate from the head if over cap
    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) {
        self.entries.push(HistoryEntry {
            role,
            content: content.into(),
        });
        if self.entries.len() > self.cap {
            let excess = self.entries.len() - self.cap;
            self.entries.drain(..excess);
        }
    }

    /// Record a completed turn: the user message then the assistant response
    pub fn record_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.push(MessageRole::User, user);
        self.push(MessageRole::Assistant, assistant);
    }

    /// The retained entries, oldest first
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Entry count
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render entries as chat messages
    #[must_use]
    pub fn to_messages(&self) -> Vec<Message> {
        self.entries
            .iter()
            .map(|e| match e.role {
                MessageRole::Assistant => Message::assistant(&e.content),
                _ => Message::user(&e.content),
            })
            .collect()
    }
}

/// Per-session history store for the HTTP boundary
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<ConversationHistory>>>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the history for a session.
    ///
    /// The returned mutex should be held across the whole turn.
    pub async fn session(&self, id: &str) -> Arc<Mutex<ConversationHistory>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationHistory::new())))
            .clone()
    }

    /// Number of active sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
