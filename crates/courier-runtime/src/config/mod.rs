//! Configuration for the Courier runtime.
//!
//! Configuration is loaded with figment from defaults, files and
//! `COURIER_*` environment variables, then checked by [`validate_config`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, PROFILE_ENV, Profile, load_config, load_config_from_file};
pub use schema::{
    CourierConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig, TelegramConfig,
};
pub use validation::{validate_config, validate_settings};
