//! Transport seam between the conversation driver and the Responses API.
//!
//! The driver only sees [`ResponsesTransport`]; [`http::HttpTransport`] is the
//! production implementation, tests plug in scripted transports.

pub mod http;

use async_trait::async_trait;

use crate::types::{ResponsesRequest, ResponsesResponse};
use crate::Result;

pub use http::HttpTransport;

/// Sends one Responses request and returns the parsed response.
///
/// Implementations map HTTP failures to [`crate::Error::Remote`] and must not
/// retry on their own; retry is the driver's job.
#[async_trait]
pub trait ResponsesTransport: Send + Sync {
    async fn create_response(&self, request: &ResponsesRequest) -> Result<ResponsesResponse>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
