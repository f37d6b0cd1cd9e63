//! # Courier Framework
//!
//! Command routing and execution for the Courier command engine.
//!
//! This layer provides:
//! - An exact-match alias table for user-defined shortcuts
//! - Plugin commands driven by declarative HTTP request templates
//! - An authorization gate for commands that change shared state
//! - The built-in command set, its registry and platform menu binding
//! - The [`Dispatcher`] tying these together behind a single `dispatch` call
//!
//! All side effects go through the collaborator traits of `courier-core`.

pub mod alias;
pub mod auth;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod plugin;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use alias::AliasTable;
pub use auth::{AuthPolicy, authorize};
pub use command::{Command, match_trigger};
pub use dispatcher::{Dispatcher, Services};
pub use error::{AuthError, CommandError, CommandResult, PluginError, PluginResult};
pub use handlers::{help_text, regenerate};
pub use plugin::{PluginOutput, RequestTemplate};
pub use registry::CommandRegistry;
