use async_trait::async_trait;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::transport::{ResponsesTransport, TransportError};
use crate::types::{ResponsesRequest, ResponsesResponse};
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// `POST {base_url}/responses` over reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "API key is empty",
                ErrorContext::new().with_field_path("OPENAI_API_KEY"),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("ALICIA_HTTP_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            timeout: None,
        })
    }

    /// Build from `ALICIA_OPENAI_BASE_URL` and `OPENAI_API_KEY` (or the legacy `OPEN_API_KEY`).
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("ALICIA_OPENAI_BASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = resolve_api_key(|k| env::var(k).ok()).ok_or_else(|| {
            Error::configuration_with_context(
                "OPENAI_API_KEY is not set (OPEN_API_KEY is accepted for compatibility)",
                ErrorContext::new().with_field_path("OPENAI_API_KEY"),
            )
        })?;
        Self::new(base_url, api_key)
    }

    /// Per-request timeout enforced by reqwest, surfaced as [`Error::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            return Error::Timeout {
                timeout_ms: self.timeout.map(|t| t.as_millis() as u64).unwrap_or_default(),
            };
        }
        Error::Transport(TransportError::Http(e))
    }
}

/// `OPENAI_API_KEY`, falling back to `OPEN_API_KEY`; blank values count as unset.
pub fn resolve_api_key<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    ["OPENAI_API_KEY", "OPEN_API_KEY"]
        .iter()
        .filter_map(|k| lookup(k))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Human readable message of a failed response body.
pub fn extract_error_message(status: u16, raw_body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(raw_body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .or_else(|| v.get("message").and_then(Value::as_str))
            .map(str::to_string)
    });

    from_json
        .or_else(|| {
            let raw = raw_body.trim();
            (!raw.is_empty()).then(|| raw.to_string())
        })
        .unwrap_or_else(|| format!("Responses API returned HTTP {}.", status))
}

#[async_trait]
impl ResponsesTransport for HttpTransport {
    async fn create_response(&self, request: &ResponsesRequest) -> Result<ResponsesResponse> {
        let request_id = Uuid::new_v4().to_string();
        debug!(
            request_id = %request_id,
            model = %request.model,
            tools = request.tool_count(),
            continuation = request.previous_response_id.is_some(),
            "sending Responses request"
        );

        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("x-client-request-id", &request_id)
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| self.map_reqwest_error(e))?;
        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        if !status.is_success() {
            let message = extract_error_message(status.as_u16(), &raw_body);
            debug!(request_id = %request_id, status = status.as_u16(), "Responses request failed");
            return Err(Error::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_str(&raw_body).unwrap_or(Value::Null);
        if !value.is_object() {
            return Err(Error::protocol_with_context(
                "invalid response body from the Responses API",
                ErrorContext::new()
                    .with_details("expected a JSON object")
                    .with_source("http_transport"),
            ));
        }

        serde_json::from_value(value).map_err(|e| {
            Error::protocol_with_context(
                "unreadable response body from the Responses API",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("http_transport"),
            )
        })
    }
}
