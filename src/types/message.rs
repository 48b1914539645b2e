//! Chat transcript and assistant request types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Single entry of the chat transcript kept by the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One caller turn handed to an assistant.
///
/// `history` already contains `message` as its last user entry; `system_patches`
/// are extra instruction blocks produced by the caller for this turn only.
#[derive(Debug, Clone, Default)]
pub struct AssistantRequest {
    pub session_id: String,
    pub message: String,
    pub history: Vec<ChatMessage>,
    pub system_patches: Vec<String>,
}

impl AssistantRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            session_id: session_id.into(),
            history: vec![ChatMessage::user(message.clone())],
            message,
            system_patches: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_system_patch(mut self, patch: impl Into<String>) -> Self {
        self.system_patches.push(patch.into());
        self
    }
}

/// Render the trailing `max_messages` entries as `[role] content` blocks.
pub fn serialize_history(history: &[ChatMessage], max_messages: usize) -> String {
    let start = history.len().saturating_sub(max_messages.max(1));
    history[start..]
        .iter()
        .map(|m| format!("[{}] {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
