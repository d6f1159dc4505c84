//! Diagnostic logging hooks.
//!
//! The crate logs through the `tracing` crate. To see logs, install a
//! subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("courier_net=debug")
//!     .init();
//! ```
//!
//! [`NetworkLogger`] and [`DataTransferErrorLogger`] are the pluggable hooks
//! the services call; the `Tracing*` types are the default implementations.
//! Loggers may be called from many in-flight requests at once.

use std::error::Error;

use crate::error::NetworkError;
use crate::http::{HttpRequest, RawResponse};

/// Target names for log filtering.
pub mod targets {
    /// Request execution and classification.
    pub const NETWORK: &str = "courier_net::network";
    /// Decoding and error resolution.
    pub const TRANSFER: &str = "courier_net::transfer";
    /// The production transport.
    pub const TRANSPORT: &str = "courier_net::transport";
}

/// Observes requests, responses and network errors.
///
/// All methods are fire-and-forget; nothing they do affects the outcome.
pub trait NetworkLogger: Send + Sync {
    /// Called before a request is handed to the transport.
    fn log_request(&self, request: &HttpRequest);

    /// Called after a successful response.
    fn log_response(&self, response: &RawResponse);

    /// Called after a failed request.
    fn log_error(&self, error: &NetworkError);
}

/// Logs network activity with `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNetworkLogger;

impl NetworkLogger for TracingNetworkLogger {
    fn log_request(&self, request: &HttpRequest) {
        // The query can carry credentials from the default parameters.
        tracing::debug!(
            target: targets::NETWORK,
            method = %request.method,
            host = request.url.host_str().unwrap_or_default(),
            path = request.url.path(),
            headers = request.headers.len(),
            body_len = request.body.as_ref().map_or(0, |b| b.len()),
            "request"
        );
        tracing::trace!(target: targets::NETWORK, url = %request.url, "request url");
        if let Some(body) = &request.body
            && let Ok(text) = std::str::from_utf8(body)
        {
            tracing::trace!(target: targets::NETWORK, body = text, "request body");
        }
    }

    fn log_response(&self, response: &RawResponse) {
        tracing::debug!(
            target: targets::NETWORK,
            status = response.status(),
            body_len = response.body_len(),
            "response"
        );
    }

    fn log_error(&self, error: &NetworkError) {
        match error {
            NetworkError::Cancelled => {
                tracing::debug!(target: targets::NETWORK, "request cancelled");
            }
            _ => tracing::warn!(target: targets::NETWORK, error = %error_chain(error), "request failed"),
        }
    }
}

/// Observes decode and network failures seen by the transfer service.
pub trait DataTransferErrorLogger: Send + Sync {
    /// Record a failure.
    fn log(&self, error: &(dyn Error + 'static));
}

/// Logs transfer failures with `tracing`, including the source chain.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTransferErrorLogger;

impl DataTransferErrorLogger for TracingTransferErrorLogger {
    fn log(&self, error: &(dyn Error + 'static)) {
        tracing::warn!(target: targets::TRANSFER, error = %error_chain(error), "data transfer failed");
    }
}

/// Render an error and its sources as `outer: cause: root`.
pub(crate) fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
