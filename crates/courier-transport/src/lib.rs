//! # Courier Transport
//!
//! Network implementations of the collaborator traits defined in
//! `courier-core`.
//!
//! | Type | Implements | Use |
//! |------|------------|-----|
//! | [`HttpClient`] | `HttpFetcher` | Plugin backends, template downloads, build info |
//! | [`TelegramBotApi`] | `MenuRegistrar` | `setMyCommands` menu registration |
//!
//! ## Features
//!
//! - `telegram` (default): the Bot API client

pub mod http;
#[cfg(feature = "telegram")]
pub mod telegram;

pub use http::{DEFAULT_TIMEOUT, HttpClient};
#[cfg(feature = "telegram")]
pub use telegram::{DEFAULT_API_DOMAIN, TelegramBotApi};
