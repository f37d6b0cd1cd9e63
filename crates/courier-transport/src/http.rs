//! `reqwest`-backed [`HttpFetcher`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Method, Request, Url};
use tracing::{debug, trace};

use courier_core::{HttpBody, HttpFetcher, HttpRequest, HttpResponse, TransportError, TransportResult};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client used for plugin backends, template downloads and build info.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default timeout.
    pub fn new() -> TransportResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::RequestFailed {
                url: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// The underlying `reqwest` client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Converts a request description into a `reqwest` request.
    fn prepare(&self, request: HttpRequest) -> TransportResult<Request> {
        let url = Url::parse(&request.url).map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", request.url)))?;
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            TransportError::RequestFailed {
                url: request.url.clone(),
                reason: format!("invalid method {}", request.method),
            }
        })?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(HttpBody::Json(value)) => builder.json(&value),
            Some(HttpBody::Form(pairs)) => builder.form(&pairs),
            Some(HttpBody::Text(text)) => builder.body(text),
            None => builder,
        };

        builder.build().map_err(|e| TransportError::RequestFailed {
            url: request.url,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl HttpFetcher for HttpClient {
    async fn fetch(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        let url = request.url.clone();
        let prepared = self.prepare(request)?;
        debug!(method = %prepared.method(), url = %url, "Sending HTTP request");

        let response = self
            .client
            .execute(prepared)
            .await
            .map_err(|e| TransportError::RequestFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| TransportError::RequestFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        trace!(url = %url, status = status.as_u16(), len = body.len(), "Received HTTP response");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body: body.to_vec(),
        })
    }
}
