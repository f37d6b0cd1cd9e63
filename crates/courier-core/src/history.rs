//! Persisted chat history entries.

use serde::{Deserialize, Serialize};

/// A single turn in a chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl HistoryItem {
    pub const USER: &'static str = "user";
    pub const ASSISTANT: &'static str = "assistant";

    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Self::USER, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == Self::USER
    }
}
