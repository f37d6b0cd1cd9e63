//! # Courier
//!
//! Command dispatch and plugin execution for a Telegram-style chat bot.
//!
//! Given an incoming message, Courier decides whether it is a command and,
//! if so, runs it and sends exactly one reply:
//!
//! ```text
//! text ──▶ alias table ──▶ plugin commands ──▶ built-in commands ──▶ reply
//!                               │                    │
//!                        request template     authorization gate
//!                        (HTTP round trip)        + handler
//! ```
//!
//! Messages that are not commands are left for the host's chat flow.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! let runtime = CourierRuntime::load(ConfigLoader::new())?;
//! let dispatcher = runtime.dispatcher(Collaborators { sender, store, roles, providers, chat_flow });
//!
//! let mut session = dispatcher.load_session(&message, &runtime.bot_identity()).await?;
//! if dispatcher.dispatch(&message, &mut session).await.is_none() {
//!     // free-form chat
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use courier_core as core;
pub use courier_framework as framework;
pub use courier_runtime as runtime;
pub use courier_transport as transport;

/// Commonly used types for embedding the engine.
pub mod prelude {
    pub use courier_runtime::{Collaborators, ConfigLoader, CourierConfig, CourierRuntime};

    pub use courier_framework::{CommandError, Dispatcher, Services};

    // Collaborator traits a host implements
    pub use courier_core::{
        ChatFlow, ChatProvider, HttpFetcher, ImageProvider, KvStore, MenuRegistrar,
        MessageSender, ProviderResolver, RoleResolver,
    };

    pub use courier_core::{
        BotIdentity, ChatAction, ChatContext, ChatMessage, ChatRole, ChatType, MemoryStore,
        PhotoSource, SendOutcome, Session, Settings, UserConfig,
    };
}
