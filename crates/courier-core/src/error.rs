//! Unified error types for the Courier core.
//!
//! This module provides the error types shared by every collaborator
//! boundary. Command-level errors (authorization, plugins, handlers) are
//! defined in courier-framework.

use thiserror::Error;

// =============================================================================
// Store Errors
// =============================================================================

/// Errors raised by a key-value store backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend could not complete the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur while talking to a remote HTTP endpoint.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request could not be sent or no response was received.
    #[error("request to {url} failed: {reason}")]
    RequestFailed {
        /// The URL that failed.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The remote answered with a non-success status.
    #[error("HTTP {status} error: {body}")]
    Status {
        /// Numeric status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

// =============================================================================
// User Configuration Errors
// =============================================================================

/// Rejections produced when writing a user configuration key.
///
/// The display strings are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigKeyError {
    /// The key is locked by the deployment.
    #[error("Key {0} is locked")]
    Locked(String),

    /// The key is not part of the configuration schema.
    #[error("Key {0} not found")]
    NotFound(String),

    /// The value cannot be coerced to the key's type.
    #[error("Invalid value for key {key}: {reason}")]
    InvalidValue {
        /// The key being written.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

// =============================================================================
// Provider Errors
// =============================================================================

/// Errors surfaced by chat or image generation providers.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider rejected or failed the request.
    #[error("{provider}: {message}")]
    Request {
        /// Provider name.
        provider: String,
        /// Failure description.
        message: String,
    },

    /// Transport failure while reaching the provider.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
