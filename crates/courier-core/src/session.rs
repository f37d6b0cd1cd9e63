//! Per-request chat session state.
//!
//! A [`Session`] is built fresh for every incoming message from the message
//! itself and whatever was persisted for the chat. It carries three parts:
//!
//! - [`ChatContext`]: where and how the reply is sent (mutable formatting state).
//! - [`ShareContext`]: identity of the bot and chat, and the storage keys.
//! - [`UserConfig`]: the chat's effective configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::StoreResult;
use crate::history::HistoryItem;
use crate::message::{ChatMessage, ChatType};
use crate::services::KvStore;
use crate::settings::Settings;
use crate::user_config::{MASK, UserConfig};

/// Text rendering mode for outgoing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    Markdown,
    MarkdownV2,
}

/// A keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardButton {
    pub text: String,
}

/// Reply keyboard attached to outgoing messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        selective: bool,
        resize_keyboard: bool,
        one_time_keyboard: bool,
    },
    Remove {
        remove_keyboard: bool,
        selective: bool,
    },
}

impl ReplyMarkup {
    /// A persistent single-row keyboard with the given buttons.
    pub fn quick_reply(buttons: &[&str]) -> Self {
        Self::Keyboard {
            keyboard: vec![
                buttons
                    .iter()
                    .map(|text| KeyboardButton {
                        text: (*text).to_string(),
                    })
                    .collect(),
            ],
            selective: true,
            resize_keyboard: true,
            one_time_keyboard: false,
        }
    }

    /// Removes any keyboard currently shown.
    pub fn remove() -> Self {
        Self::Remove {
            remove_keyboard: true,
            selective: true,
        }
    }
}

/// Reply target and formatting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    pub chat_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    pub parse_mode: Option<ParseMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
    #[serde(default)]
    pub disable_web_page_preview: bool,
}

impl ChatContext {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            reply_to_message_id: None,
            parse_mode: Some(ParseMode::Markdown),
            reply_markup: None,
            disable_web_page_preview: true,
        }
    }
}

/// The bot a session is served by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub token: String,
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BotIdentity {
    /// Builds an identity from a Bot API token; the id is the token's
    /// numeric prefix (`123456:ABC...`).
    pub fn from_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let id = token.split(':').next().and_then(|p| p.parse().ok());
        Self {
            token,
            id,
            name: None,
        }
    }
}

/// Identity of the bot and chat, plus storage keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareContext {
    pub bot_token: String,
    pub bot_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
    pub chat_id: i64,
    pub chat_type: ChatType,
    pub speaker_id: Option<i64>,
    pub history_key: String,
    pub config_store_key: String,
}

impl ShareContext {
    /// Derives identity and storage keys for `message`.
    ///
    /// Keys are `history:{chat}` and `user_config:{chat}`, suffixed with the
    /// bot id when known. In group chats without share mode every member
    /// gets their own keys.
    pub fn new(message: &ChatMessage, bot: &BotIdentity, share_mode: bool) -> Self {
        let chat_id = message.chat.id;
        let speaker_id = message.from.as_ref().map(|u| u.id);

        let mut history_key = format!("history:{chat_id}");
        let mut config_store_key = format!("user_config:{chat_id}");
        if let Some(bot_id) = bot.id {
            history_key.push_str(&format!(":{bot_id}"));
            config_store_key.push_str(&format!(":{bot_id}"));
        }
        if message.chat.kind.is_group()
            && !share_mode
            && let Some(speaker) = speaker_id
        {
            history_key.push_str(&format!(":{speaker}"));
            config_store_key.push_str(&format!(":{speaker}"));
        }

        Self {
            bot_token: bot.token.clone(),
            bot_id: bot.id,
            bot_name: bot.name.clone(),
            chat_id,
            chat_type: message.chat.kind,
            speaker_id,
            history_key,
            config_store_key,
        }
    }

    /// Returns a copy with the bot token masked.
    pub fn redacted(&self) -> Self {
        Self {
            bot_token: MASK.to_string(),
            ..self.clone()
        }
    }
}

/// Everything a command handler may read or change for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub chat: ChatContext,
    pub share: ShareContext,
    pub config: UserConfig,
}

impl Session {
    /// Builds a session without touching storage.
    pub fn new(message: &ChatMessage, bot: &BotIdentity, settings: &Settings) -> Self {
        let mut chat = ChatContext::new(message.chat.id);
        if message.chat.kind.is_group() {
            chat.reply_to_message_id = Some(message.message_id);
        }
        Self {
            chat,
            share: ShareContext::new(message, bot, settings.share_mode),
            config: settings.base_user_config(),
        }
    }

    /// Builds a session and applies the chat's persisted configuration.
    ///
    /// A corrupt persisted configuration is logged and ignored.
    pub async fn load(
        message: &ChatMessage,
        bot: &BotIdentity,
        settings: &Settings,
        store: &dyn KvStore,
    ) -> StoreResult<Self> {
        let mut session = Self::new(message, bot, settings);
        if let Some(raw) = store.get(&session.share.config_store_key).await? {
            match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(persisted) => session
                    .config
                    .apply_persisted(&persisted, &settings.lock_user_config_keys),
                Err(e) => warn!(
                    key = %session.share.config_store_key,
                    error = %e,
                    "Persisted user config is not a JSON object"
                ),
            }
        }
        Ok(session)
    }

    /// Reads the persisted chat history; a missing entry is an empty history.
    pub async fn load_history(&self, store: &dyn KvStore) -> StoreResult<Vec<HistoryItem>> {
        match store.get(&self.share.history_key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Writes the trimmed configuration under the chat's config key.
    pub async fn persist_config(&self, store: &dyn KvStore, locked: &[String]) -> StoreResult<()> {
        let trimmed = Value::Object(self.config.trim(locked));
        store
            .put(&self.share.config_store_key, &serde_json::to_string(&trimmed)?)
            .await
    }
}
