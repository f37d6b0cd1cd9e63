//! # Courier Core
//!
//! Domain types and collaborator interfaces for the Courier command engine.
//!
//! This crate holds everything the engine shares with its surroundings:
//!
//! - **Messages**: incoming chat messages, chat types and member roles ([`ChatMessage`])
//! - **Session**: per-request chat state and storage keys ([`Session`])
//! - **User configuration**: schema, coercion, locking and trimming ([`UserConfig`])
//! - **Settings**: immutable deployment settings ([`Settings`])
//! - **Services**: traits for every side effect ([`MessageSender`], [`KvStore`], ...)
//!
//! The dispatcher and command handlers live in `courier-framework`.

pub mod error;
pub mod history;
pub mod message;
pub mod services;
pub mod session;
pub mod settings;
pub mod store;
pub mod user_config;

pub use error::{
    ConfigKeyError, ProviderError, ProviderResult, StoreError, StoreResult, TransportError,
    TransportResult,
};
pub use history::HistoryItem;
pub use message::{Chat, ChatMessage, ChatRole, ChatType, User};
pub use services::{
    ChatAction, ChatFlow, ChatProvider, CommandScope, HttpBody, HttpFetcher, HttpRequest,
    HttpResponse, ImageProvider, KvStore, MenuCommand, MenuRegistrar, MenuRequest,
    MessageSender, PhotoSource, ProviderResolver, RoleResolver, ScopeRef, SendOutcome,
};
pub use session::{
    BotIdentity, ChatContext, KeyboardButton, ParseMode, ReplyMarkup, Session, ShareContext,
};
pub use settings::{
    BuildInfo, CustomCommand, DEFAULT_UPDATE_INFO_URL, PluginCommand, Settings, Strings,
};
pub use store::MemoryStore;
pub use user_config::{DEFINE_KEYS, UserConfig};
