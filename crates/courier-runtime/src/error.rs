//! Runtime error types.

use thiserror::Error;

use courier_core::TransportError;

use crate::config::ConfigError;

/// Errors that can occur while assembling or driving the engine.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A platform call failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
