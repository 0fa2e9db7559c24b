//! ============================================================================
//! HTTP Transport - The only place strategies touch the network
//! ============================================================================
//! Strategies describe a request as an `HttpRequest` and hand it to an
//! `HttpTransport`. The default implementation wraps `reqwest`; tests swap in
//! a recording transport so they can count outbound calls.
//! ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::StrategyError;
use crate::types::pairs_to_object;

/// HTTP methods used by the strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Outbound request description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    /// Sent as `application/x-www-form-urlencoded` when non-empty
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            query: Vec::new(),
            form: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = form;
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Header lookup, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Non-2xx responses become `StrategyError::Provider`
    pub fn error_for_status(self) -> Result<Self, StrategyError> {
        if self.is_success() {
            Ok(self)
        } else {
            let body = self.decoded_body();
            Err(StrategyError::Provider {
                status: self.status,
                body,
            })
        }
    }

    /// Decode the body as JSON, URL-encoded form, or plain text, in that
    /// order of preference. XML and anything unrecognized stay a string.
    pub fn decoded_body(&self) -> Value {
        let content_type = self.content_type.as_deref().unwrap_or("").to_ascii_lowercase();
        let trimmed = self.body.trim();

        if content_type.contains("json") || trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                return value;
            }
        }

        if content_type.contains("xml") || trimmed.starts_with('<') {
            return Value::String(self.body.clone());
        }

        if content_type.contains("x-www-form-urlencoded") || looks_form_encoded(trimmed) {
            if let Ok(pairs) = serde_urlencoded::from_str::<Vec<(String, String)>>(trimmed) {
                return Value::Object(pairs_to_object(pairs));
            }
        }

        Value::String(self.body.clone())
    }
}

fn looks_form_encoded(body: &str) -> bool {
    !body.is_empty()
        && body.contains('=')
        && !body.chars().any(char::is_whitespace)
}

/// Why a request produced no usable response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// Sent (or attempted) but nothing came back: DNS, connect, timeout, reset
    #[error("no response: {0}")]
    NoResponse(String),

    /// Failed on our side: the request could not be built, or a response
    /// arrived but its body could not be read
    #[error("local failure: {0}")]
    Local(String),
}

impl From<TransportFailure> for StrategyError {
    fn from(failure: TransportFailure) -> Self {
        match failure {
            TransportFailure::NoResponse(reason) => StrategyError::Transport(reason),
            TransportFailure::Local(reason) => StrategyError::Unexpected(reason),
        }
    }
}

/// Sends exactly one request per call. No retries.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

/// Settings for the default transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// No deadline unless set; callers own their timeouts
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: concat!("oauth-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_config(&TransportConfig::default())
    }

    pub fn with_config(config: &TransportConfig) -> Self {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        debug!("{} {}", request.method.as_str(), request.url);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(body_read_failure)?;

        debug!("Provider answered {}", status);
        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// The status line already arrived, so this is not a missing response
fn body_read_failure(e: impl std::fmt::Display) -> TransportFailure {
    TransportFailure::Local(format!("failed to read response body: {}", e))
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportFailure {
    if e.is_builder() {
        TransportFailure::Local(e.to_string())
    } else {
        TransportFailure::NoResponse(e.to_string())
    }
}
