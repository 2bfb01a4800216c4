//! Maps low-level failures onto [`ExpressError`].
//!
//! Every failure of a broker call passes through here exactly once, together
//! with the request URL and the request's description, so the caller always
//! receives one of the three endpoint-level variants with full context.

use crate::errors::{EndpointCause, ExpressError, TransportError};

/// Classifies a transport failure.
///
/// - `Unauthorized` becomes [`ExpressError::InvalidCredentials`], unless the
///   request does not check credentials, in which case it is an endpoint
///   failure.
/// - `NotFound` becomes [`ExpressError::NotFound`].
/// - Anything else becomes [`ExpressError::Endpoint`].
pub fn classify_transport(
    error: TransportError,
    url: impl Into<String>,
    action: impl Into<String>,
    checks_credentials: bool,
) -> ExpressError {
    let url = url.into();
    let action = action.into();
    match error {
        TransportError::Unauthorized { .. } if checks_credentials => {
            ExpressError::InvalidCredentials {
                url,
                action,
                source: Some(error),
            }
        }
        TransportError::NotFound => ExpressError::NotFound {
            url,
            action,
            source: Some(error),
        },
        other => ExpressError::Endpoint {
            url,
            action,
            source: EndpointCause::Transport(other),
        },
    }
}

/// Wraps any non-transport failure (bad URL, unserialisable request,
/// unreadable response) as an endpoint failure.
pub fn endpoint_failure(
    cause: impl Into<EndpointCause>,
    url: impl Into<String>,
    action: impl Into<String>,
) -> ExpressError {
    ExpressError::Endpoint {
        url: url.into(),
        action: action.into(),
        source: cause.into(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::errors::UnmarshalError;

    const URL: &str = "https://openshift.redhat.com/broker/userinfo";

    #[rstest]
    #[case::unauthorized(TransportError::Unauthorized { status: 401 })]
    #[case::forbidden(TransportError::Unauthorized { status: 403 })]
    fn rejected_credentials_are_reported_as_such(#[case] error: TransportError) {
        let classified = classify_transport(error, URL, "get user info", true);
        assert!(classified.is_invalid_credentials(), "got {classified:?}");
        assert_eq!(classified.url(), Some(URL));
    }

    #[test]
    fn rejection_without_credential_check_is_an_endpoint_failure() {
        let classified = classify_transport(
            TransportError::Unauthorized { status: 401 },
            URL,
            "list available cartridges",
            false,
        );
        assert!(
            matches!(
                classified,
                ExpressError::Endpoint {
                    source: EndpointCause::Transport(TransportError::Unauthorized { status: 401 }),
                    ..
                }
            ),
            "got {classified:?}"
        );
    }

    #[rstest]
    #[case::checked(true)]
    #[case::unchecked(false)]
    fn missing_resource_is_not_found(#[case] checks_credentials: bool) {
        let classified =
            classify_transport(TransportError::NotFound, URL, "get user info", checks_credentials);
        assert!(matches!(classified, ExpressError::NotFound { .. }), "got {classified:?}");
    }

    #[rstest]
    #[case::status(TransportError::Status { status: 500, body: "oops".to_owned() })]
    #[case::timeout(TransportError::Timeout("deadline elapsed".to_owned()))]
    #[case::connection(TransportError::Connection("refused".to_owned()))]
    #[case::malformed(TransportError::MalformedUrl {
        url: "x".to_owned(),
        reason: "relative".to_owned(),
    })]
    fn other_transport_failures_are_endpoint_failures(#[case] error: TransportError) {
        let classified = classify_transport(error.clone(), URL, "get user info", true);
        match classified {
            ExpressError::Endpoint {
                source: EndpointCause::Transport(inner),
                action,
                ..
            } => {
                assert_eq!(inner, error);
                assert_eq!(action, "get user info");
            }
            other => panic!("expected endpoint failure, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_response_is_an_endpoint_failure() {
        let error = endpoint_failure(
            UnmarshalError::MissingField { field: "uuid" },
            URL,
            "create domain \"foo\"",
        );
        assert_eq!(
            error.to_string(),
            format!("Could not create domain \"foo\" at \"{URL}\"")
        );
        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("response is missing required field \"uuid\"")
        );
    }
}
