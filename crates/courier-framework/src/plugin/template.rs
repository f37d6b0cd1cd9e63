//! Declarative request templates.
//!
//! A template is a JSON document describing one HTTP call and how to turn
//! its response into a chat reply:
//!
//! ```json
//! {
//!   "url": "https://dns.google/resolve?name={{DATA[0]}}&type={{DATA[1]}}",
//!   "method": "GET",
//!   "headers": {"accept": "application/dns-json"},
//!   "input": {"type": "space-separated", "required": true},
//!   "response": {
//!     "content": {
//!       "input_type": "json",
//!       "output_type": "html",
//!       "output": "{{#each a in Answer}}<b>{{a.name}}</b> {{a.data}}\n{{/each}}"
//!     },
//!     "error": {"input_type": "text", "output_type": "text", "output": "{{.}}"}
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PluginError, PluginResult};

fn default_method() -> String {
    "GET".to_string()
}

fn default_output() -> String {
    "{{.}}".to_string()
}

/// A plugin request template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestTemplate {
    /// Target URL; interpolated values are percent-encoded.
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Extra query parameters appended to the URL.
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub input: InputSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodySpec>,
    #[serde(default)]
    pub response: ResponseSpec,
}

impl RequestTemplate {
    /// Parses template JSON.
    pub fn parse(raw: &str) -> PluginResult<Self> {
        serde_json::from_str(raw).map_err(|e| PluginError::InvalidTemplate(e.to_string()))
    }
}

/// How the subcommand text becomes `DATA`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    /// The raw text.
    #[default]
    Text,
    /// Parsed as JSON.
    Json,
    /// Split on whitespace into an array.
    SpaceSeparated,
    /// Split on commas into an array of trimmed, non-empty items.
    CommaSeparated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(rename = "type", default)]
    pub kind: InputType,
    /// Reject an empty subcommand.
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Json,
    Form,
    Text,
}

/// Request body. For `json` every string inside `content` is interpolated;
/// for `form` `content` is an object of field templates; for `text` it is a
/// single template string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    #[serde(rename = "type")]
    pub kind: BodyType,
    pub content: Value,
}

/// How the response body is decoded before rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseInput {
    #[default]
    Json,
    Text,
    /// Raw bytes; only meaningful for `image` output.
    Blob,
}

/// What the rendered output is sent as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Text,
    Markdown,
    Html,
    Image,
}

/// One response interpretation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMapping {
    #[serde(default)]
    pub input_type: ResponseInput,
    #[serde(default)]
    pub output_type: OutputType,
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for OutputMapping {
    fn default() -> Self {
        Self {
            input_type: ResponseInput::default(),
            output_type: OutputType::default(),
            output: default_output(),
        }
    }
}

/// Interpretation of successful and failed responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSpec {
    #[serde(default)]
    pub content: OutputMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OutputMapping>,
}
