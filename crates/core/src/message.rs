//! Chat message value objects.
//!
//! The transport receives an ordered list of role-tagged messages; only the
//! final one, which must come from the user, drives a turn.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The assistant replying to the user
    Assistant,
    /// System instructions
    System,
    /// Any other sender (tool output, function results). Kept so a history
    /// with unfamiliar roles still parses; it never drives a turn.
    #[serde(other)]
    Other,
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Return the content of the final message if it was sent by the user.
///
/// `None` for an empty history or when the last speaker was anyone else.
pub fn last_user_message(messages: &[ChatMessage]) -> Option<&str> {
    match messages.last() {
        Some(m) if m.role == Role::User => Some(m.content.as_str()),
        _ => None,
    }
}
