//! Collaborator interfaces consumed by the command engine.
//!
//! Every side effect the engine performs goes through one of these traits:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MessageSender`] | Deliver text, photos and presence indicators to a chat |
//! | [`KvStore`] | Persist chat history and per-chat configuration |
//! | [`RoleResolver`] | Look up the caller's role in a group chat |
//! | [`ProviderResolver`] | Select chat / image providers from user configuration |
//! | [`HttpFetcher`] | Fetch plugin templates, build info, plugin backends |
//! | [`MenuRegistrar`] | Register the command menu with the platform |
//! | [`ChatFlow`] | Run a chat-completion turn (used by `/redo`) |

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProviderResult, StoreResult, TransportError, TransportResult};
use crate::history::HistoryItem;
use crate::message::ChatRole;
use crate::session::{ChatContext, Session, ShareContext};
use crate::user_config::UserConfig;

// =============================================================================
// Outbound messages
// =============================================================================

/// Image payload for a photo message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    /// A URL the platform downloads itself.
    Url(String),
    /// Raw image bytes uploaded with the request.
    Bytes(Vec<u8>),
}

/// Presence indicator shown while a reply is being prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Typing,
    UploadPhoto,
}

impl ChatAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Typing => "typing",
            Self::UploadPhoto => "upload_photo",
        }
    }
}

/// Result of a send call as reported by the platform.
///
/// Transport failures are folded into an unsuccessful outcome rather than
/// raised, so a reply can always be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendOutcome {
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl SendOutcome {
    /// A successful delivery.
    pub fn delivered(body: impl Into<String>) -> Self {
        Self {
            ok: true,
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    /// A failed delivery.
    pub fn failed(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            ok: false,
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }
}

/// Sends replies to the chat described by a [`ChatContext`].
///
/// Implementations honor the context's parse mode and reply markup.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, chat: &ChatContext, text: &str) -> SendOutcome;

    async fn send_photo(&self, chat: &ChatContext, photo: PhotoSource) -> SendOutcome;

    async fn send_chat_action(&self, chat: &ChatContext, action: ChatAction) -> SendOutcome;
}

// =============================================================================
// Storage and roles
// =============================================================================

/// String key-value storage.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deletes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Resolves the sender's role in the current chat.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Returns `None` when the role could not be determined.
    async fn resolve_role(&self, share: &ShareContext) -> Option<ChatRole>;
}

// =============================================================================
// Providers
// =============================================================================

/// A chat-completion backend, as far as the command engine needs to know.
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Configuration key holding the model name (e.g. `OPENAI_CHAT_MODEL`).
    fn model_key(&self) -> &str;

    fn model(&self, config: &UserConfig) -> Option<String>;
}

/// An image-generation backend.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model_key(&self) -> &str;

    fn model(&self, config: &UserConfig) -> Option<String>;

    async fn request(&self, prompt: &str, config: &UserConfig) -> ProviderResult<PhotoSource>;
}

/// Picks providers according to a chat's configuration.
pub trait ProviderResolver: Send + Sync {
    fn chat_provider(&self, config: &UserConfig) -> Option<Arc<dyn ChatProvider>>;

    fn image_provider(&self, config: &UserConfig) -> Option<Arc<dyn ImageProvider>>;
}

/// Runs a chat-completion turn and replies with the result.
#[async_trait]
pub trait ChatFlow: Send + Sync {
    /// Continues the conversation from `history` with `message` as the new
    /// user turn (`None` when there is nothing new to say).
    async fn chat(
        &self,
        session: &mut Session,
        history: Vec<HistoryItem>,
        message: Option<String>,
    ) -> ProviderResult<SendOutcome>;
}

// =============================================================================
// HTTP
// =============================================================================

/// Body of an outbound HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    Json(Value),
    Form(Vec<(String, String)>),
    Text(String),
}

/// An outbound HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8 (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> TransportResult<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Fails with [`TransportError::Status`] unless the status is 2xx.
    pub fn error_for_status(self) -> TransportResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status,
                body: self.text(),
            })
        }
    }
}

/// Performs outbound HTTP requests.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> TransportResult<HttpResponse>;

    /// GETs `url` and returns the body as text; non-2xx is an error.
    async fn get_text(&self, url: &str) -> TransportResult<String> {
        let response = self.fetch(HttpRequest::get(url)).await?.error_for_status()?;
        Ok(response.text())
    }

    /// GETs `url` and decodes the body as JSON; non-2xx is an error.
    async fn get_json(&self, url: &str) -> TransportResult<Value> {
        self.fetch(HttpRequest::get(url))
            .await?
            .error_for_status()?
            .json()
    }
}

// =============================================================================
// Command menu
// =============================================================================

/// Where a command is advertised in the platform menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandScope {
    AllPrivateChats,
    AllGroupChats,
    AllChatAdministrators,
}

impl CommandScope {
    pub const ALL: [CommandScope; 3] = [
        Self::AllPrivateChats,
        Self::AllGroupChats,
        Self::AllChatAdministrators,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllPrivateChats => "all_private_chats",
            Self::AllGroupChats => "all_group_chats",
            Self::AllChatAdministrators => "all_chat_administrators",
        }
    }
}

/// One entry of the command menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCommand {
    pub command: String,
    pub description: String,
}

/// Scope object in the platform's wire format (`{"type": "..."}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRef {
    #[serde(rename = "type")]
    pub kind: CommandScope,
}

/// A single menu registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRequest {
    pub commands: Vec<MenuCommand>,
    pub scope: ScopeRef,
}

/// Registers command menus with the chat platform.
#[async_trait]
pub trait MenuRegistrar: Send + Sync {
    /// Registers one scope's menu and returns the platform's acknowledgement.
    async fn set_my_commands(&self, request: &MenuRequest) -> TransportResult<Value>;
}
