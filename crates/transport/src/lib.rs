//! HTTP adapter for the OpenShift Express broker.
//!
//! Implements the [`protocol::Transport`] port over `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection handling, TLS, timeouts and the mapping of
//! HTTP statuses onto [`protocol::TransportError`] live here. The `protocol`
//! and `client` crates see only [`protocol::Transport`].
//!
//! One call performs exactly one POST. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use protocol::{Transport, TransportError, FORM_CONTENT_TYPE};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest body excerpt carried in [`TransportError::Status`].
const BODY_PREVIEW_CHARS: usize = 200;

/// Failure to construct an [`HttpTransport`].
#[derive(Debug, Error)]
pub enum HttpTransportError {
    /// The underlying HTTP client could not be built (e.g. TLS backend
    /// initialisation failed).
    #[error("could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, HttpTransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpTransportError::Build)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &Url,
        user_agent: &str,
        body: String,
    ) -> Result<String, TransportError> {
        tracing::debug!(%url, body_len = body.len(), "posting broker request");
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(USER_AGENT, user_agent)
            .body(body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| map_reqwest_error(url, e))?;
        tracing::debug!(%url, status = status.as_u16(), body_len = text.len(), "broker responded");
        check_status(status, &text)?;
        Ok(text)
    }
}

/// Maps a non-success status onto the classified transport outcome.
fn check_status(status: StatusCode, body: &str) -> Result<(), TransportError> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::NOT_FOUND => TransportError::NotFound,
        _ => TransportError::Status {
            status: status.as_u16(),
            body: body_preview(body),
        },
    })
}

fn map_reqwest_error(url: &Url, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_builder() {
        TransportError::MalformedUrl {
            url: url.to_string(),
            reason: error.to_string(),
        }
    } else {
        TransportError::Connection(error.to_string())
    }
}

fn body_preview(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_owned(),
    }
}
