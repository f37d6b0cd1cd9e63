//! # Courier Runtime
//!
//! Process-level glue for the Courier command engine:
//!
//! - Layered configuration loading and validation ([`ConfigLoader`], [`validate_config`])
//! - Logging initialization ([`LoggingBuilder`], [`logging::init_from_config`])
//! - Assembly of a [`Dispatcher`](courier_framework::Dispatcher) from
//!   configuration and host collaborators ([`CourierRuntime`])
//!
//! ```rust,ignore
//! use courier_runtime::{ConfigLoader, CourierRuntime, logging};
//!
//! let runtime = CourierRuntime::load(ConfigLoader::new())?;
//! logging::init_from_config(&runtime.config().logging);
//! runtime.bind_commands().await?;
//! let dispatcher = runtime.dispatcher(collaborators);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, CourierConfig, LoggingConfig, TelegramConfig,
    validate_config,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{Collaborators, CourierRuntime};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
