//! In-memory chat sessions and persisted feedback.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::types::{AppError, ChatMessage, MessageRole, Result};

// ============================================================================
// Sessions
// ============================================================================

/// A chat session transcript.
///
/// Conversations are single-turn: the transcript exists for display and for
/// attaching feedback to assistant messages, not for conditioning the model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

/// Thread-safe store of active sessions.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    greeting: String,
}

impl SessionStore {
    /// Create a store. New sessions are seeded with `greeting` as the first
    /// assistant message.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            greeting: greeting.into(),
        }
    }

    /// Fetch an existing session, or create one (with the seeded greeting)
    /// when `id` is `None` or unknown. Returns the session id.
    pub fn get_or_create(&self, id: Option<&str>) -> String {
        if let Some(id) = id {
            if self.sessions.read().contains_key(id) {
                return id.to_string();
            }
        }

        let session_id = id.map(String::from).unwrap_or_else(|| Uuid::new_v4().to_string());
        let session = Session {
            id: session_id.clone(),
            created_at: Utc::now(),
            messages: vec![ChatMessage {
                id: Uuid::new_v4().to_string(),
                role: MessageRole::Assistant,
                content: self.greeting.clone(),
                created_at: Utc::now(),
            }],
        };

        self.sessions.write().insert(session_id.clone(), session);
        session_id
    }

    /// Append a message to a session. Returns the message id.
    pub fn push_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<String> {
        self.push_message_with_id(session_id, Uuid::new_v4().to_string(), role, content)
    }

    /// Append a message with a caller-chosen id.
    ///
    /// The chat handler announces the assistant message id before streaming,
    /// so the stored message must reuse it.
    pub fn push_message_with_id(
        &self,
        session_id: &str,
        message_id: String,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<String> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound(format!("Session '{}' not found", session_id)))?;

        session.messages.push(ChatMessage {
            id: message_id.clone(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        });

        Ok(message_id)
    }

    /// Get a session by id.
    pub fn get(&self, session_id: &str) -> Result<Session> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session '{}' not found", session_id)))
    }

    /// Check whether a session contains a message.
    pub fn has_message(&self, session_id: &str, message_id: &str) -> bool {
        self.sessions
            .read()
            .get(session_id)
            .map(|s| s.messages.iter().any(|m| m.id == message_id))
            .unwrap_or(false)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

// ============================================================================
// Feedback
// ============================================================================

/// A thumbs-up/down rating of an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedbackRecord {
    pub message_id: String,
    pub session_id: String,
    pub is_good: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Feedback store with JSONL append persistence.
///
/// Each record is one JSON line. Records are replayed from disk at startup;
/// a message accepts feedback at most once.
pub struct FeedbackStore {
    records: RwLock<Vec<FeedbackRecord>>,
    path: PathBuf,
}

impl FeedbackStore {
    /// Open a store, replaying any existing records from `path`.
    ///
    /// A missing file is treated as an empty store. Unparseable lines are
    /// skipped with a warning.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut records = Vec::new();

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| AppError::Internal(format!("Failed to read feedback file: {}", e)))?;
            for line in content.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<FeedbackRecord>(line) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unparseable feedback line");
                    }
                }
            }
        }

        Ok(Self {
            records: RwLock::new(records),
            path,
        })
    }

    /// Record feedback for a message.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the message already has feedback.
    pub fn record(
        &self,
        session_id: &str,
        message_id: &str,
        is_good: bool,
        reason: Option<String>,
    ) -> Result<FeedbackRecord> {
        let record = FeedbackRecord {
            message_id: message_id.to_string(),
            session_id: session_id.to_string(),
            is_good,
            reason,
            created_at: Utc::now(),
        };

        {
            let mut records = self.records.write();
            if records.iter().any(|r| r.message_id == message_id) {
                return Err(AppError::InvalidInput(format!(
                    "Feedback already recorded for message '{}'",
                    message_id
                )));
            }
            records.push(record.clone());
        }

        self.append_to_disk(&record)?;

        Ok(record)
    }

    /// All recorded feedback, oldest first.
    pub fn list(&self) -> Vec<FeedbackRecord> {
        self.records.read().clone()
    }

    /// Number of recorded feedback entries.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn append_to_disk(&self, record: &FeedbackRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Internal(format!("Failed to create feedback directory: {}", e))
            })?;
        }

        let line = serde_json::to_string(record)
            .map_err(|e| AppError::Internal(format!("Failed to serialize feedback: {}", e)))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Internal(format!("Failed to open feedback file: {}", e)))?;

        writeln!(file, "{}", line)
            .map_err(|e| AppError::Internal(format!("Failed to write feedback: {}", e)))?;

        Ok(())
    }
}
