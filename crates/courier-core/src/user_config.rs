//! Per-chat user configuration.
//!
//! A [`UserConfig`] is a JSON object whose recognized keys are fixed by a
//! schema of defaults. Users override individual keys through chat commands;
//! every override is recorded in the `DEFINE_KEYS` list, and only those keys
//! are persisted. A deployment can lock keys so they never become user
//! settable.
//!
//! # Coercion
//!
//! Values written by users usually arrive as strings. They are coerced to the
//! JSON type of the key's default:
//!
//! | Default type | Accepted string input |
//! |--------------|-----------------------|
//! | string / null | taken as-is |
//! | number | integer or float literal |
//! | boolean | `true` / `false` |
//! | array | JSON array, or a comma-separated list |
//! | object | JSON object |

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::warn;

use crate::error::ConfigKeyError;

/// Name of the bookkeeping key listing user-defined overrides.
pub const DEFINE_KEYS: &str = "DEFINE_KEYS";

/// Placeholder written over credentials in redacted copies.
pub const MASK: &str = "******";

/// Well-known configuration keys.
pub mod keys {
    pub const AI_PROVIDER: &str = "AI_PROVIDER";
    pub const AI_IMAGE_PROVIDER: &str = "AI_IMAGE_PROVIDER";
    pub const SYSTEM_INIT_MESSAGE: &str = "SYSTEM_INIT_MESSAGE";
    pub const SYSTEM_INIT_MESSAGE_ROLE: &str = "SYSTEM_INIT_MESSAGE_ROLE";

    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_CHAT_MODEL: &str = "OPENAI_CHAT_MODEL";
    pub const OPENAI_API_BASE: &str = "OPENAI_API_BASE";
    pub const OPENAI_API_EXTRA_PARAMS: &str = "OPENAI_API_EXTRA_PARAMS";

    pub const DALL_E_MODEL: &str = "DALL_E_MODEL";
    pub const DALL_E_IMAGE_SIZE: &str = "DALL_E_IMAGE_SIZE";
    pub const DALL_E_IMAGE_QUALITY: &str = "DALL_E_IMAGE_QUALITY";
    pub const DALL_E_IMAGE_STYLE: &str = "DALL_E_IMAGE_STYLE";

    pub const AZURE_API_KEY: &str = "AZURE_API_KEY";
    pub const AZURE_COMPLETIONS_API: &str = "AZURE_COMPLETIONS_API";
    pub const AZURE_DALLE_API: &str = "AZURE_DALLE_API";

    pub const CLOUDFLARE_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
    pub const CLOUDFLARE_TOKEN: &str = "CLOUDFLARE_TOKEN";
    pub const WORKERS_CHAT_MODEL: &str = "WORKERS_CHAT_MODEL";
    pub const WORKERS_IMAGE_MODEL: &str = "WORKERS_IMAGE_MODEL";

    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
    pub const GOOGLE_COMPLETIONS_API: &str = "GOOGLE_COMPLETIONS_API";
    pub const GOOGLE_COMPLETIONS_MODEL: &str = "GOOGLE_COMPLETIONS_MODEL";

    pub const MISTRAL_API_KEY: &str = "MISTRAL_API_KEY";
    pub const MISTRAL_API_BASE: &str = "MISTRAL_API_BASE";
    pub const MISTRAL_CHAT_MODEL: &str = "MISTRAL_CHAT_MODEL";

    pub const COHERE_API_KEY: &str = "COHERE_API_KEY";
    pub const COHERE_API_BASE: &str = "COHERE_API_BASE";
    pub const COHERE_CHAT_MODEL: &str = "COHERE_CHAT_MODEL";

    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const ANTHROPIC_API_BASE: &str = "ANTHROPIC_API_BASE";
    pub const ANTHROPIC_CHAT_MODEL: &str = "ANTHROPIC_CHAT_MODEL";
}

/// Short names accepted in place of the full key.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("API_KEY", keys::OPENAI_API_KEY),
    ("CHAT_MODEL", keys::OPENAI_CHAT_MODEL),
    ("WORKERS_AI_MODEL", keys::WORKERS_CHAT_MODEL),
];

/// Keys holding secrets; masked in redacted copies.
pub const CREDENTIAL_KEYS: &[&str] = &[
    keys::OPENAI_API_KEY,
    keys::AZURE_API_KEY,
    keys::AZURE_COMPLETIONS_API,
    keys::AZURE_DALLE_API,
    keys::CLOUDFLARE_ACCOUNT_ID,
    keys::CLOUDFLARE_TOKEN,
    keys::GOOGLE_API_KEY,
    keys::MISTRAL_API_KEY,
    keys::COHERE_API_KEY,
    keys::ANTHROPIC_API_KEY,
];

/// Keys locked when the deployment does not say otherwise.
pub fn default_locked_keys() -> Vec<String> {
    [
        keys::OPENAI_API_BASE,
        keys::GOOGLE_COMPLETIONS_API,
        keys::MISTRAL_API_BASE,
        keys::COHERE_API_BASE,
        keys::ANTHROPIC_API_BASE,
        keys::AZURE_COMPLETIONS_API,
        keys::AZURE_DALLE_API,
    ]
    .iter()
    .map(|k| (*k).to_string())
    .collect()
}

/// Resolves a key alias to its canonical name.
pub fn normalize_key(key: &str) -> &str {
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

/// The built-in configuration schema with its default values.
pub fn default_schema() -> Map<String, Value> {
    let entries: [(&str, Value); 31] = [
        (keys::AI_PROVIDER, json!("auto")),
        (keys::AI_IMAGE_PROVIDER, json!("auto")),
        (keys::SYSTEM_INIT_MESSAGE, Value::Null),
        (keys::SYSTEM_INIT_MESSAGE_ROLE, json!("system")),
        (keys::OPENAI_API_KEY, json!([])),
        (keys::OPENAI_CHAT_MODEL, json!("gpt-4o-mini")),
        (keys::OPENAI_API_BASE, json!("https://api.openai.com/v1")),
        (keys::OPENAI_API_EXTRA_PARAMS, json!({})),
        (keys::DALL_E_MODEL, json!("dall-e-3")),
        (keys::DALL_E_IMAGE_SIZE, json!("1024x1024")),
        (keys::DALL_E_IMAGE_QUALITY, json!("standard")),
        (keys::DALL_E_IMAGE_STYLE, json!("vivid")),
        (keys::AZURE_API_KEY, Value::Null),
        (keys::AZURE_COMPLETIONS_API, Value::Null),
        (keys::AZURE_DALLE_API, Value::Null),
        (keys::CLOUDFLARE_ACCOUNT_ID, Value::Null),
        (keys::CLOUDFLARE_TOKEN, Value::Null),
        (keys::WORKERS_CHAT_MODEL, json!("@cf/mistral/mistral-7b-instruct-v0.1")),
        (
            keys::WORKERS_IMAGE_MODEL,
            json!("@cf/stabilityai/stable-diffusion-xl-base-1.0"),
        ),
        (keys::GOOGLE_API_KEY, Value::Null),
        (
            keys::GOOGLE_COMPLETIONS_API,
            json!("https://generativelanguage.googleapis.com/v1beta/models/"),
        ),
        (keys::GOOGLE_COMPLETIONS_MODEL, json!("gemini-pro")),
        (keys::MISTRAL_API_KEY, Value::Null),
        (keys::MISTRAL_API_BASE, json!("https://api.mistral.ai/v1")),
        (keys::MISTRAL_CHAT_MODEL, json!("mistral-tiny")),
        (keys::COHERE_API_KEY, Value::Null),
        (keys::COHERE_API_BASE, json!("https://api.cohere.com/v1")),
        (keys::COHERE_CHAT_MODEL, json!("command-r-plus")),
        (keys::ANTHROPIC_API_KEY, Value::Null),
        (keys::ANTHROPIC_API_BASE, json!("https://api.anthropic.com/v1")),
        (keys::ANTHROPIC_CHAT_MODEL, json!("claude-3-haiku-20240307")),
    ];
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// A chat's effective configuration: schema defaults plus user overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct UserConfig {
    /// Defaults for every recognized key; also the coercion templates.
    defaults: Arc<Map<String, Value>>,
    /// Current values for every recognized key.
    values: Map<String, Value>,
    /// Keys the user has explicitly overridden, in first-set order.
    defined: Vec<String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self::new(default_schema())
    }
}

impl UserConfig {
    /// Creates a configuration holding only the given defaults.
    pub fn new(defaults: Map<String, Value>) -> Self {
        Self {
            values: defaults.clone(),
            defaults: Arc::new(defaults),
            defined: Vec::new(),
        }
    }

    /// Returns a fresh configuration sharing this one's defaults.
    pub fn reset(&self) -> Self {
        Self {
            defaults: Arc::clone(&self.defaults),
            values: (*self.defaults).clone(),
            defined: Vec::new(),
        }
    }

    /// Returns `true` if `key` is part of the schema.
    pub fn is_recognized(&self, key: &str) -> bool {
        key != DEFINE_KEYS && self.defaults.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns a string value, treating `null` and empty strings as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Keys the user has overridden.
    pub fn defined_keys(&self) -> &[String] {
        &self.defined
    }

    /// Checks that `key` may be written. Returns the canonical key name.
    pub fn check_writable<'k>(
        &self,
        key: &'k str,
        locked: &[String],
    ) -> Result<&'k str, ConfigKeyError> {
        let key = normalize_key(key);
        if locked.iter().any(|k| k == key) {
            return Err(ConfigKeyError::Locked(key.to_string()));
        }
        if !self.is_recognized(key) {
            return Err(ConfigKeyError::NotFound(key.to_string()));
        }
        Ok(key)
    }

    /// Overrides `key` with `value`, coerced to the key's type.
    ///
    /// Nothing is mutated when the key is locked, unknown, or the value
    /// cannot be coerced.
    pub fn set(&mut self, key: &str, value: Value, locked: &[String]) -> Result<(), ConfigKeyError> {
        let key = self.check_writable(key, locked)?;
        let template = self.defaults.get(key).unwrap_or(&Value::Null);
        let coerced = coerce(template, value).map_err(|reason| ConfigKeyError::InvalidValue {
            key: key.to_string(),
            reason,
        })?;

        if !self.defined.iter().any(|k| k == key) {
            self.defined.push(key.to_string());
        }
        self.values.insert(key.to_string(), coerced);
        Ok(())
    }

    /// Clears an override: the value becomes `null` and the key is no longer
    /// defined (so it is not persisted).
    pub fn unset(&mut self, key: &str, locked: &[String]) -> Result<(), ConfigKeyError> {
        let key = self.check_writable(key, locked)?;
        self.values.insert(key.to_string(), Value::Null);
        self.defined.retain(|k| k != key);
        Ok(())
    }

    /// Returns the persistable subset: defined, unlocked keys plus
    /// `DEFINE_KEYS` itself.
    pub fn trim(&self, locked: &[String]) -> Map<String, Value> {
        let kept: Vec<&String> = self
            .defined
            .iter()
            .filter(|k| !locked.contains(k))
            .collect();

        let mut out = Map::new();
        for key in &kept {
            if let Some(value) = self.values.get(key.as_str()) {
                out.insert((*key).clone(), value.clone());
            }
        }
        out.insert(
            DEFINE_KEYS.to_string(),
            Value::Array(kept.into_iter().map(|k| Value::String(k.clone())).collect()),
        );
        out
    }

    /// Applies a previously persisted configuration object.
    ///
    /// Only keys listed in its `DEFINE_KEYS` are considered; locked and
    /// unknown keys are dropped so they never reappear as defined.
    pub fn apply_persisted(&mut self, persisted: &Map<String, Value>, locked: &[String]) {
        let Some(Value::Array(defined)) = persisted.get(DEFINE_KEYS) else {
            return;
        };
        for key in defined.iter().filter_map(Value::as_str) {
            let Some(value) = persisted.get(key) else {
                continue;
            };
            if let Err(e) = self.set(key, value.clone(), locked) {
                warn!(key = %key, error = %e, "Ignoring persisted user config entry");
            }
        }
    }

    /// Returns a copy with every credential replaced by [`MASK`].
    ///
    /// `self` is left untouched.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for key in CREDENTIAL_KEYS {
            if let Some(value) = copy.values.get_mut(*key) {
                *value = match value {
                    Value::Array(_) => json!([MASK]),
                    _ => Value::String(MASK.to_string()),
                };
            }
        }
        copy
    }
}

/// Coerces `value` to the JSON type of `template`.
fn coerce(template: &Value, value: Value) -> Result<Value, String> {
    let Value::String(raw) = value else {
        return match (template, &value) {
            (Value::Null | Value::String(_), _)
            | (Value::Number(_), Value::Number(_))
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_)) => Ok(value),
            _ => Err(format!("expected {}", type_name(template))),
        };
    };

    match template {
        Value::Null | Value::String(_) => Ok(Value::String(raw)),
        Value::Number(_) => {
            let trimmed = raw.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(Value::from(n));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{raw}' is not a number"))
        }
        Value::Bool(_) => match raw.trim().to_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("'{raw}' is not a boolean")),
        },
        Value::Array(_) => {
            let trimmed = raw.trim();
            if trimmed.starts_with('[') {
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(v @ Value::Array(_)) => Ok(v),
                    Ok(_) => Err("expected a JSON array".to_string()),
                    Err(e) => Err(e.to_string()),
                }
            } else {
                Ok(Value::Array(
                    trimmed
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| Value::String(s.to_string()))
                        .collect(),
                ))
            }
        }
        Value::Object(_) => match serde_json::from_str::<Value>(raw.trim()) {
            Ok(v @ Value::Object(_)) => Ok(v),
            Ok(_) => Err("expected a JSON object".to_string()),
            Err(e) => Err(e.to_string()),
        },
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
