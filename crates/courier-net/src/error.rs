//! Error types for the data-transfer layer.
//!
//! Errors are split into two layers. [`NetworkError`] covers everything up to
//! and including the HTTP status line; [`DataTransferError`] adds the failures
//! that happen while turning a body into a typed value and wraps
//! `NetworkError` for passthrough.

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;

/// A boxed error used for decoder and resolver failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The native failure class reported by a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The call was cancelled before it finished.
    Cancelled,
    /// There is no network path to the host.
    NotConnected,
    /// The call did not finish in time.
    TimedOut,
    /// The connection could not be established or was dropped.
    Connection,
    /// Any other transport failure.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::NotConnected => write!(f, "not connected"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Connection => write!(f, "connection failed"),
            Self::Other => write!(f, "transport failure"),
        }
    }
}

/// A failure reported by a [`Transport`](crate::transport::Transport).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    /// Create a transport error of the given kind.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A cancellation reported by the transport.
    pub fn cancelled() -> Self {
        Self::new(TransportErrorKind::Cancelled, "request cancelled")
    }

    /// A connectivity loss reported by the transport.
    pub fn not_connected(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::NotConnected, message)
    }

    /// Any other failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, message)
    }

    /// The failure class.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Human readable detail from the transport.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Reasons an [`Endpoint`](crate::http::Endpoint) cannot be turned into a request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RequestGenerationError {
    /// The combined base URL and path is not a valid absolute URL.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A header name or value is not valid HTTP.
    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },

    /// Query or body parameters could not be encoded.
    #[error("parameters could not be encoded: {0}")]
    Parameters(String),

    /// The body encoder failed.
    #[error("body could not be encoded: {0}")]
    Body(String),
}

/// Transport and HTTP-status failures.
#[derive(Clone, Debug, thiserror::Error)]
pub enum NetworkError {
    /// The server answered with a status code of 400 or above.
    #[error("HTTP {status_code}")]
    Error {
        /// The HTTP status code.
        status_code: u16,
        /// The response body, kept for server-provided error details.
        data: Option<Bytes>,
    },

    /// No network path to the host.
    #[error("not connected to the network")]
    NotConnected,

    /// The request was cancelled.
    #[error("request was cancelled")]
    Cancelled,

    /// Any other transport failure.
    #[error(transparent)]
    Generic(TransportError),

    /// The request could not be built from its endpoint.
    #[error("request could not be generated")]
    UrlGeneration(#[source] RequestGenerationError),
}

impl NetworkError {
    /// Returns `true` only for [`NetworkError::Error`] with exactly `code`.
    pub fn has_status_code(&self, code: u16) -> bool {
        match self {
            Self::Error { status_code, .. } => *status_code == code,
            _ => false,
        }
    }

    /// The HTTP status code, if the server answered with an error status.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Error { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns `true` for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.has_status_code(404)
    }

    /// Returns `true` if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<TransportError> for NetworkError {
    fn from(err: TransportError) -> Self {
        match err.kind() {
            TransportErrorKind::Cancelled => Self::Cancelled,
            TransportErrorKind::NotConnected => Self::NotConnected,
            _ => Self::Generic(err),
        }
    }
}

impl From<RequestGenerationError> for NetworkError {
    fn from(err: RequestGenerationError) -> Self {
        Self::UrlGeneration(err)
    }
}

/// Failures surfaced by [`DataTransferService`](crate::transfer::DataTransferService).
#[derive(Debug, thiserror::Error)]
pub enum DataTransferError {
    /// The call succeeded but carried no body where one was required.
    #[error("response contained no data")]
    NoResponse,

    /// The body could not be decoded into the requested type.
    #[error("failed to decode response")]
    Parsing(#[source] BoxError),

    /// A network-layer failure, passed through unchanged.
    #[error(transparent)]
    NetworkFailure(#[from] NetworkError),

    /// A network-layer failure replaced by the configured error resolver.
    #[error(transparent)]
    ResolvedNetworkFailure(BoxError),
}

impl DataTransferError {
    /// The underlying network error, if this is a passthrough failure.
    pub fn network_error(&self) -> Option<&NetworkError> {
        match self {
            Self::NetworkFailure(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.network_error().is_some_and(NetworkError::is_cancelled)
    }
}

/// Errors loading a [`NetworkConfig`](crate::config::NetworkConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has the wrong shape.
    #[error("invalid network config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_status_code_matches_only_exact_status() {
        let err = NetworkError::Error {
            status_code: 400,
            data: None,
        };
        assert!(err.has_status_code(400));
        assert!(!err.has_status_code(399));
        assert!(!err.has_status_code(401));
    }

    #[test]
    fn has_status_code_is_false_for_other_variants() {
        let others = [
            NetworkError::NotConnected,
            NetworkError::Cancelled,
            NetworkError::Generic(TransportError::other("boom")),
            NetworkError::UrlGeneration(RequestGenerationError::Parameters("x".into())),
        ];
        for err in others {
            for code in [0, 200, 400, 404, 500] {
                assert!(!err.has_status_code(code), "{err:?} matched {code}");
            }
            assert_eq!(err.status_code(), None);
        }
    }

    #[test]
    fn transport_kinds_map_to_network_errors() {
        assert!(matches!(
            NetworkError::from(TransportError::cancelled()),
            NetworkError::Cancelled
        ));
        assert!(matches!(
            NetworkError::from(TransportError::not_connected("offline")),
            NetworkError::NotConnected
        ));
        let timed_out = TransportError::new(TransportErrorKind::TimedOut, "slow");
        match NetworkError::from(timed_out.clone()) {
            NetworkError::Generic(inner) => assert_eq!(inner, timed_out),
            other => panic!("expected generic, got {other:?}"),
        }
    }

    #[test]
    fn not_found_is_404() {
        let err = NetworkError::Error {
            status_code: 404,
            data: Some(Bytes::from_static(b"missing")),
        };
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn wrapped_errors_do_not_repeat_their_source() {
        use std::error::Error as _;

        let cause = serde_json::from_slice::<serde_json::Value>(b"nope").unwrap_err();
        let parsing = DataTransferError::Parsing(Box::new(cause));
        assert_eq!(parsing.to_string(), "failed to decode response");
        assert!(parsing.source().is_some());

        let resolved =
            DataTransferError::ResolvedNetworkFailure(Box::new(TransportError::other("session expired")));
        assert_eq!(resolved.to_string(), "transport failure: session expired");
        assert!(resolved.source().is_none());

        let generic = NetworkError::Generic(TransportError::other("reset"));
        assert_eq!(generic.to_string(), "transport failure: reset");
        assert!(generic.source().is_none());

        let generation = NetworkError::UrlGeneration(RequestGenerationError::Parameters("x".into()));
        assert_eq!(generation.to_string(), "request could not be generated");
        assert!(generation.source().is_some());
    }

    #[test]
    fn transfer_error_exposes_cancellation() {
        let err = DataTransferError::from(NetworkError::Cancelled);
        assert!(err.is_cancelled());
        assert!(!DataTransferError::NoResponse.is_cancelled());
    }
}
