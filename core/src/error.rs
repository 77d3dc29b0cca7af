//! Error types for the account API client.
//!
//! # Design
//! Every failure is returned to the immediate caller; nothing is retried or
//! logged here. Callers branch on the variant: `InvalidArgument` never
//! touched the network, `Transport` never produced a response, and
//! `MalformedResponse` / `Downstream` describe a body that did arrive.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by `Transport` and `AccountService`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A local precondition failed before any request was built.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The round trip itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body was not a decodable envelope.
    #[error("malformed response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// The server answered with an `error_message` envelope.
    #[error("downstream api error: {0}")]
    Downstream(String),

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The request path could not be resolved against the base URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failures below the envelope: connection, DNS, TLS, timeouts, cancellation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] ureq::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl ApiError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    #[must_use]
    pub fn is_downstream(&self) -> bool {
        matches!(self, Self::Downstream(_))
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The server-provided text of a `Downstream` error.
    #[must_use]
    pub fn downstream_message(&self) -> Option<&str> {
        match self {
            Self::Downstream(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        Self::Transport(TransportError::Http(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downstream_display_has_fixed_prefix() {
        let err = ApiError::Downstream("record abc does not exist".to_string());
        assert_eq!(err.to_string(), "downstream api error: record abc does not exist");
        assert_eq!(err.downstream_message(), Some("record abc does not exist"));
        assert!(err.is_downstream());
    }

    #[test]
    fn cancellation_is_a_transport_error() {
        let err = ApiError::from(TransportError::Cancelled);
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "request cancelled");
    }

    #[test]
    fn malformed_response_keeps_parse_error_as_source() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ApiError::MalformedResponse(parse_err);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("malformed response"));
    }

    #[test]
    fn invalid_argument_helper() {
        let err = ApiError::invalid_argument("id must not be empty");
        assert!(err.is_invalid_argument());
        assert!(err.downstream_message().is_none());
    }
}
