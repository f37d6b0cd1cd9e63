//! Configuration validation utilities.

use std::collections::HashSet;

use courier_core::{Settings, UserConfig};
use courier_core::user_config::default_schema;

use super::error::{ConfigError, ConfigResult};
use super::schema::{CourierConfig, LogOutput, LoggingConfig, TelegramConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &CourierConfig) -> ConfigResult<()> {
    validate_logging(&config.logging)?;
    validate_telegram(&config.telegram)?;
    validate_settings(&config.bot)?;
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module names cannot be empty"));
    }
    Ok(())
}

fn validate_telegram(telegram: &TelegramConfig) -> ConfigResult<()> {
    validate_url(&telegram.api_domain)?;
    if telegram.timeout_secs == 0 {
        return Err(ConfigError::validation("Timeout must be greater than 0"));
    }
    Ok(())
}

/// Validates the command engine settings.
pub fn validate_settings(settings: &Settings) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    let triggers = settings
        .custom_commands
        .iter()
        .map(|c| c.trigger.as_str())
        .chain(settings.plugin_commands.iter().map(|p| p.trigger.as_str()));
    for trigger in triggers {
        if !trigger.starts_with('/') {
            return Err(ConfigError::validation(format!(
                "Command trigger must start with '/': {trigger}"
            )));
        }
        if trigger.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Command trigger cannot contain spaces: {trigger}"
            )));
        }
        if !seen.insert(trigger) {
            return Err(ConfigError::DuplicateTrigger(trigger.to_string()));
        }
    }

    for plugin in &settings.plugin_commands {
        if plugin.template.trim().is_empty() {
            return Err(ConfigError::missing_field(format!(
                "bot.plugin_commands[{}].template",
                plugin.trigger
            )));
        }
    }

    let schema = UserConfig::new(default_schema());
    for key in &settings.lock_user_config_keys {
        if !schema.is_recognized(key) {
            return Err(ConfigError::validation(format!(
                "Unknown locked user config key: {key}"
            )));
        }
    }

    if !settings.update_info_url.is_empty() {
        validate_url(&settings.update_info_url)?;
    }
    Ok(())
}

fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("url"));
    }
    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    }
    Ok(())
}
