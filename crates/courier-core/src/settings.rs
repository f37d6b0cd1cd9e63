//! Process-wide, immutable settings.
//!
//! [`Settings`] is built once at start-up (usually by the runtime's config
//! loader) and shared by reference with every component that needs it.
//! Nothing mutates it while requests are being handled.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::user_config::{UserConfig, default_locked_keys, default_schema};

/// A user-defined alias: an exact trigger rewritten to another command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCommand {
    pub trigger: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A plugin command backed by a request template.
///
/// `template` is either inline template JSON or an `http(s)` URL the JSON is
/// fetched from on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginCommand {
    pub trigger: String,
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The build this binary was produced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Unix timestamp (seconds) of the build.
    #[serde(rename = "ts")]
    pub timestamp: i64,
    pub sha: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            timestamp: option_env!("COURIER_BUILD_TIMESTAMP")
                .and_then(|ts| ts.parse().ok())
                .unwrap_or(0),
            sha: option_env!("COURIER_BUILD_SHA")
                .unwrap_or("local")
                .to_string(),
        }
    }
}

/// User-facing strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strings {
    pub help_summary: String,
    pub help_new: String,
    pub help_start: String,
    pub help_img: String,
    pub help_redo: String,
    pub help_setenv: String,
    pub help_setenvs: String,
    pub help_delenv: String,
    pub help_clearenv: String,
    pub help_version: String,
    pub help_system: String,
    pub help_help: String,
    pub help_echo: String,
    pub new_chat_start: String,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            help_summary: "The following commands are currently supported:".into(),
            help_new: "Start a new conversation".into(),
            help_start: "Get your ID and start a new conversation".into(),
            help_img: "Generate an image, the complete command format is `/img image description`, for example `/img beach at moonlight`".into(),
            help_redo: "Redo the last conversation, /redo with modified content or directly /redo".into(),
            help_setenv: "Set user configuration, the complete command format is /setenv KEY=VALUE".into(),
            help_setenvs: "Batch set user configurations, the full format of the command is /setenvs {\"KEY1\": \"VALUE1\", \"KEY2\": \"VALUE2\"}".into(),
            help_delenv: "Delete user configuration, the complete command format is /delenv KEY".into(),
            help_clearenv: "Clear all user configuration".into(),
            help_version: "Get the current version number to determine whether to update".into(),
            help_system: "View some system information".into(),
            help_help: "Get command help".into(),
            help_echo: "Echo the message".into(),
            new_chat_start: "A new conversation has started".into(),
        }
    }
}

/// Deployment settings consumed by the command engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether all members of a group share one conversation context.
    ///
    /// When enabled, config-mutating commands in groups are restricted to
    /// administrators.
    pub share_mode: bool,
    /// Show the `/new` `/redo` quick-reply keyboard in private chats.
    pub show_reply_button: bool,
    /// Enables debug-only commands and verbose `/system` output.
    pub dev_mode: bool,
    /// Configuration keys users can never change.
    pub lock_user_config_keys: Vec<String>,
    /// Commands left out of the platform command menu.
    pub hide_command_buttons: Vec<String>,
    /// Exact-match aliases, in lookup order.
    pub custom_commands: Vec<CustomCommand>,
    /// Plugin commands, in match order.
    pub plugin_commands: Vec<PluginCommand>,
    /// Exposed to plugin templates as `ENV`.
    pub plugins_env: Map<String, Value>,
    /// Overrides for the user configuration defaults.
    pub user_config: Map<String, Value>,
    pub build: BuildInfo,
    /// Where the latest build info JSON is published. Empty means
    /// [`DEFAULT_UPDATE_INFO_URL`].
    pub update_info_url: String,
    pub strings: Strings,
}

/// Build info published alongside each release.
pub const DEFAULT_UPDATE_INFO_URL: &str =
    "https://raw.githubusercontent.com/USTC-XeF2/courier/main/dist/buildinfo.json";

impl Default for Settings {
    fn default() -> Self {
        Self {
            share_mode: true,
            show_reply_button: false,
            dev_mode: false,
            lock_user_config_keys: default_locked_keys(),
            hide_command_buttons: Vec::new(),
            custom_commands: Vec::new(),
            plugin_commands: Vec::new(),
            plugins_env: Map::new(),
            user_config: Map::new(),
            build: BuildInfo::default(),
            update_info_url: DEFAULT_UPDATE_INFO_URL.to_string(),
            strings: Strings::default(),
        }
    }
}

impl Settings {
    /// Returns the user configuration every chat starts from.
    ///
    /// Overrides for keys outside the schema are ignored.
    pub fn base_user_config(&self) -> UserConfig {
        let mut schema = default_schema();
        for (key, value) in &self.user_config {
            if let Some(slot) = schema.get_mut(key) {
                *slot = value.clone();
            }
        }
        UserConfig::new(schema)
    }

    /// Returns the description declared for a custom command trigger.
    pub fn custom_command_description(&self, trigger: &str) -> Option<&str> {
        self.custom_commands
            .iter()
            .find(|c| c.trigger == trigger)
            .and_then(|c| c.description.as_deref())
    }

    /// Returns the description declared for a plugin trigger.
    pub fn plugin_description(&self, trigger: &str) -> Option<&str> {
        self.plugin_commands
            .iter()
            .find(|c| c.trigger == trigger)
            .and_then(|c| c.description.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_config::keys;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.share_mode);
        assert!(!settings.dev_mode);
        assert!(
            settings
                .lock_user_config_keys
                .contains(&keys::OPENAI_API_BASE.to_string())
        );
    }

    #[test]
    fn test_base_user_config_applies_known_overrides() {
        let mut settings = Settings::default();
        settings
            .user_config
            .insert(keys::OPENAI_CHAT_MODEL.into(), json!("gpt-4"));
        settings.user_config.insert("UNKNOWN".into(), json!(1));

        let config = settings.base_user_config();
        assert_eq!(config.get_str(keys::OPENAI_CHAT_MODEL), Some("gpt-4"));
        assert!(!config.is_recognized("UNKNOWN"));
        assert!(config.defined_keys().is_empty());
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let settings: Settings = serde_json::from_value(json!({
            "share_mode": false,
            "plugin_commands": [
                {"trigger": "/dns", "template": "https://example.com/dns.json", "description": "DNS lookup"}
            ],
            "build": {"ts": 1700000000, "sha": "abc123"}
        }))
        .unwrap();

        assert!(!settings.share_mode);
        assert_eq!(settings.plugin_description("/dns"), Some("DNS lookup"));
        assert_eq!(settings.build.timestamp, 1_700_000_000);
        assert_eq!(settings.strings, Strings::default());
    }
}
