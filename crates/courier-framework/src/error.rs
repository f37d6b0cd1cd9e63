//! Error types for the Courier framework.
//!
//! Every error here is eventually rendered to the user as
//! `ERROR: <display string>` by the dispatcher, so display strings are
//! written for chat users rather than operators.

use thiserror::Error;

use courier_core::{ChatRole, ConfigKeyError, ProviderError, StoreError, TransportError};

/// Authorization denials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The role resolver could not determine the caller's role.
    #[error("Get chat role failed")]
    RoleUnavailable,

    /// The caller's role is not among the permitted ones.
    #[error("Permission denied, need {}", join_roles(.required))]
    PermissionDenied {
        /// Roles that would have been accepted.
        required: Vec<ChatRole>,
    },
}

fn join_roles(roles: &[ChatRole]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Failures while resolving or executing a plugin template.
#[derive(Debug, Clone, Error)]
pub enum PluginError {
    /// The template is not valid template JSON.
    #[error("invalid plugin template: {0}")]
    InvalidTemplate(String),

    /// The template requires input but none was given.
    #[error("Missing input")]
    MissingInput,

    /// The input could not be coerced to the declared shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The rendered request URL does not parse.
    #[error("invalid plugin URL: {0}")]
    InvalidUrl(String),

    /// A `{{...}}` expression could not be rendered.
    #[error("template render error: {0}")]
    Render(String),

    /// The response mapping is not supported for the response kind.
    #[error("Invalid output type")]
    InvalidOutputType,

    /// The plugin backend answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Status {
        /// Numeric status code.
        status: u16,
        /// Rendered error output, or the raw body.
        detail: String,
    },

    /// Fetching the template or calling the backend failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors produced while running a command.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Config(#[from] ConfigKeyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// `/redo` was used without any persisted history.
    #[error("History not found")]
    HistoryNotFound,

    /// No image provider is configured for the chat.
    #[error("Image generator not found")]
    ImageProviderNotFound,

    #[error("{0}")]
    Other(String),
}

impl CommandError {
    /// Creates a free-form command error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Result type for command execution.
pub type CommandResult<T> = Result<T, CommandError>;

/// Result type for plugin execution.
pub type PluginResult<T> = Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_names_roles() {
        let err = AuthError::PermissionDenied {
            required: vec![ChatRole::Administrator, ChatRole::Creator],
        };
        assert_eq!(
            err.to_string(),
            "Permission denied, need administrator or creator"
        );
    }

    #[test]
    fn test_transparent_config_error() {
        let err = CommandError::from(ConfigKeyError::Locked("X".into()));
        assert_eq!(err.to_string(), "Key X is locked");
    }
}
