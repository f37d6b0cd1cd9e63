//! Telegram Bot API client.
//!
//! Only the calls the command engine needs are implemented: menu
//! registration through `setMyCommands`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use courier_core::{MenuRegistrar, MenuRequest, TransportError, TransportResult};

/// Default Bot API endpoint.
pub const DEFAULT_API_DOMAIN: &str = "https://api.telegram.org";

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client bound to one bot token.
#[derive(Debug, Clone)]
pub struct TelegramBotApi {
    api_domain: String,
    token: String,
    client: Client,
}

impl TelegramBotApi {
    pub fn new(api_domain: impl Into<String>, token: impl Into<String>, client: Client) -> Self {
        Self {
            api_domain: api_domain.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    /// URL of a Bot API method.
    pub fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_domain, self.token, method)
    }

    /// Calls `method` with a JSON body and returns the decoded response.
    ///
    /// The full response object is returned even when `ok` is false, since
    /// callers report the platform's acknowledgement verbatim.
    pub async fn call(&self, method: &str, body: &Value) -> TransportResult<Value> {
        let url = self.endpoint(method);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed {
                // The token is part of the path; keep it out of errors.
                url: format!("{}/bot***/{}", self.api_domain, method),
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| TransportError::Decode(e.without_url().to_string()))?;
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if let Ok(envelope) = serde_json::from_value::<ApiEnvelope>(value.clone())
            && !envelope.ok
        {
            warn!(
                method,
                status = status.as_u16(),
                description = envelope.description.as_deref().unwrap_or_default(),
                "Bot API call rejected"
            );
        }
        Ok(value)
    }
}

#[async_trait]
impl MenuRegistrar for TelegramBotApi {
    async fn set_my_commands(&self, request: &MenuRequest) -> TransportResult<Value> {
        debug!(
            scope = request.scope.kind.as_str(),
            count = request.commands.len(),
            "Registering command menu"
        );
        let body = serde_json::to_value(request)?;
        let ack = self.call("setMyCommands", &body).await?;
        info!(scope = request.scope.kind.as_str(), "Command menu registered");
        Ok(ack)
    }
}
