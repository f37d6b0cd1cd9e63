//! Incoming chat messages and the chat metadata attached to them.
//!
//! The shapes mirror the Telegram Bot API so an update body can be
//! deserialized directly into a [`ChatMessage`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of chat a message was posted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatType {
    /// Returns `true` for multi-member chats (`group` and `supergroup`).
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group | Self::Supergroup)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Group => "group",
            Self::Supergroup => "supergroup",
            Self::Channel => "channel",
        }
    }
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's status inside a chat, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Administrator => "administrator",
            Self::Member => "member",
            Self::Restricted => "restricted",
            Self::Left => "left",
            Self::Kicked => "kicked",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The chat a message belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// The author of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// An incoming chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl ChatMessage {
    /// Creates a text message in the given chat.
    pub fn text(chat: Chat, text: impl Into<String>) -> Self {
        Self {
            message_id: 0,
            chat,
            from: None,
            text: Some(text.into()),
            caption: None,
        }
    }

    /// Sets the author of the message (builder pattern).
    pub fn with_from(mut self, from: User) -> Self {
        self.from = Some(from);
        self
    }

    /// Returns the trimmed command text: the body, else the caption, else `""`.
    pub fn command_text(&self) -> &str {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or_default()
            .trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(kind: ChatType) -> Chat {
        Chat {
            id: 42,
            kind,
            title: None,
            username: None,
        }
    }

    #[test]
    fn test_group_detection() {
        assert!(ChatType::Group.is_group());
        assert!(ChatType::Supergroup.is_group());
        assert!(!ChatType::Private.is_group());
        assert!(!ChatType::Channel.is_group());
    }

    #[test]
    fn test_command_text_prefers_body_and_trims() {
        let mut msg = ChatMessage::text(chat(ChatType::Private), "  /new  ");
        msg.caption = Some("/img cat".into());
        assert_eq!(msg.command_text(), "/new");
    }

    #[test]
    fn test_command_text_falls_back_to_caption() {
        let mut msg = ChatMessage::text(chat(ChatType::Private), "");
        msg.text = None;
        msg.caption = Some(" /img cat ".into());
        assert_eq!(msg.command_text(), "/img cat");

        msg.caption = None;
        assert_eq!(msg.command_text(), "");
    }

    #[test]
    fn test_deserialize_telegram_shape() {
        let raw = r#"{
            "message_id": 7,
            "chat": {"id": -100, "type": "supergroup", "title": "dev"},
            "from": {"id": 5, "is_bot": false, "first_name": "Ann"},
            "text": "/help"
        }"#;
        let msg: ChatMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.chat.kind, ChatType::Supergroup);
        assert_eq!(msg.from.unwrap().id, 5);
    }
}
