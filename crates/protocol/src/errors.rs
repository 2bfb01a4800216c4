//! Error taxonomy for broker calls.
//!
//! [`ExpressError`] is the closed set of outcomes a caller can branch on. The
//! remaining types describe *why* a call failed and travel inside it as the
//! error source:
//!
//! - [`TransportError`]: what the HTTP collaborator reported.
//! - [`UnmarshalError`]: the response arrived but could not be read.
//! - [`ValidationError`]: a request was never sent because its input was
//!   malformed.
//!
//! Nothing here is retried. Every classified error is terminal for the call
//! that produced it.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Caller-facing taxonomy
// ---------------------------------------------------------------------------

/// Errors surfaced by every broker operation.
///
/// Each variant except [`ExpressError::Validation`] carries the request URL
/// and the human-readable description of the attempted action (e.g.
/// `start application "myapp"`), so the rendered message is a complete
/// sentence without further context.
#[derive(Debug, Error)]
pub enum ExpressError {
    /// The broker rejected the login/password pair.
    #[error("Could not {action}: invalid credentials for \"{url}\"")]
    InvalidCredentials {
        /// URL of the rejected request.
        url: String,
        /// Human-readable description of the attempted action.
        action: String,
        /// Underlying transport failure, if the rejection came from one.
        #[source]
        source: Option<TransportError>,
    },

    /// The resource or the service endpoint does not exist.
    #[error("Could not {action}: nothing found at \"{url}\"")]
    NotFound {
        /// URL of the failed request.
        url: String,
        /// Human-readable description of the attempted action.
        action: String,
        /// Underlying transport failure, if the absence was reported by one.
        #[source]
        source: Option<TransportError>,
    },

    /// Reachability or protocol failure: malformed URL, connection failure,
    /// unexpected status, or an unreadable response.
    #[error("Could not {action} at \"{url}\"")]
    Endpoint {
        /// URL of the failed request.
        url: String,
        /// Human-readable description of the attempted action.
        action: String,
        /// What went wrong.
        #[source]
        source: EndpointCause,
    },

    /// Request input was malformed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ExpressError {
    /// Returns the URL of the failed request, if one was attempted.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::InvalidCredentials { url, .. }
            | Self::NotFound { url, .. }
            | Self::Endpoint { url, .. } => Some(url),
            Self::Validation(_) => None,
        }
    }

    /// Returns `true` if the broker rejected the caller's credentials.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials { .. })
    }
}

/// Underlying cause of an [`ExpressError::Endpoint`].
#[derive(Debug, Error)]
pub enum EndpointCause {
    /// The transport failed or the broker answered with an unexpected status.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request URL could not be parsed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The request payload could not be serialised.
    #[error("could not serialize request: {0}")]
    Request(#[source] serde_json::Error),

    /// The broker answered but the response could not be unmarshalled.
    #[error(transparent)]
    Response(#[from] UnmarshalError),
}

// ---------------------------------------------------------------------------
// Transport outcomes
// ---------------------------------------------------------------------------

/// Failure reported by a [`crate::Transport`] implementation.
///
/// Transports classify HTTP statuses into these variants; the dispatcher maps
/// them onto [`ExpressError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// HTTP 401 or 403.
    #[error("request was not authorized (HTTP {status})")]
    Unauthorized {
        /// The status code returned.
        status: u16,
    },

    /// HTTP 404.
    #[error("resource not found (HTTP 404)")]
    NotFound,

    /// The transport could not use the URL it was given.
    #[error("malformed url \"{url}\": {reason}")]
    MalformedUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Any other non-success status.
    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        /// The status code returned.
        status: u16,
        /// A short preview of the response body.
        body: String,
    },

    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, reset, TLS failure or similar.
    #[error("connection failed: {0}")]
    Connection(String),
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// A sanitized response could not be turned into a domain result.
///
/// Partial results are never produced: any of these fails the whole response.
#[derive(Debug, Error)]
pub enum UnmarshalError {
    /// The response is not JSON even after sanitizing.
    #[error("response is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// The `data` field does not have the shape expected for this operation,
    /// including missing required fields.
    #[error("unexpected {shape} data: {source}")]
    Shape {
        /// Name of the expected result shape.
        shape: &'static str,
        /// Decoder error naming the offending field.
        #[source]
        source: serde_json::Error,
    },

    /// A required field is absent.
    #[error("response is missing required field \"{field}\"")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field is present but its value is unusable.
    #[error("invalid value for \"{field}\": {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A date field could not be parsed.
    #[error("invalid date \"{value}\" in \"{field}\": {source}")]
    InvalidDate {
        /// Name of the offending field.
        field: &'static str,
        /// The raw value.
        value: String,
        /// Parser error.
        #[source]
        source: chrono::ParseError,
    },
}

// ---------------------------------------------------------------------------
// Construction-time validation
// ---------------------------------------------------------------------------

/// Malformed input to a request or identifier constructor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required value is empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Wire name of the field.
        field: &'static str,
    },

    /// A value exceeds the broker's length limit.
    #[error("{field} must be at most {max} characters, got {len}")]
    TooLong {
        /// Wire name of the field.
        field: &'static str,
        /// Maximum permitted length.
        max: usize,
        /// Actual length.
        len: usize,
    },

    /// A value contains characters other than ASCII letters and digits.
    #[error("{field} must be alphanumeric, got \"{value}\"")]
    NotAlphanumeric {
        /// Wire name of the field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An SSH key type other than `ssh-rsa` or `ssh-dss`.
    #[error("unsupported ssh key type \"{0}\"")]
    UnknownKeyType(String),
}
