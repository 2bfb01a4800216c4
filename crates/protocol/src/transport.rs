//! Port to the HTTP collaborator.
//!
//! The protocol crate never performs I/O itself. The dispatcher hands each
//! encoded envelope to a [`Transport`], which performs exactly one
//! form-encoded POST and reports either the response body or a classified
//! [`TransportError`].

use async_trait::async_trait;
use url::Url;

use crate::errors::TransportError;

/// Performs one form-encoded POST per call.
///
/// Implementations must not retry. Statuses 401/403 map to
/// [`TransportError::Unauthorized`], 404 to [`TransportError::NotFound`],
/// and any other non-2xx status to [`TransportError::Status`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs `body` (content type [`crate::FORM_CONTENT_TYPE`]) to `url` and
    /// returns the raw response body.
    async fn post(
        &self,
        url: &Url,
        user_agent: &str,
        body: String,
    ) -> Result<String, TransportError>;
}
