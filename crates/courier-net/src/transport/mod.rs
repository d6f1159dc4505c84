//! The transport seam.
//!
//! A [`Transport`] is the only part of the stack that touches the network.
//! It reports exactly what happened, `(data?, response?, error?)`, and leaves
//! classification to [`NetworkService`](crate::network::NetworkService).
//! Tests substitute a deterministic implementation; production code uses
//! [`ReqwestTransport`].

mod client;

use bytes::Bytes;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub use client::{ReqwestTransport, ReqwestTransportBuilder, TransportConfig};

/// Everything a transport observed for one call.
#[derive(Clone, Debug, Default)]
pub struct TransportOutcome {
    /// The body bytes, if any were received.
    pub data: Option<Bytes>,
    /// The response metadata, if a response arrived.
    pub response: Option<HttpResponse>,
    /// The transport-level error, if any.
    pub error: Option<TransportError>,
}

impl TransportOutcome {
    /// A response arrived.
    pub fn response(response: HttpResponse, data: Option<Bytes>) -> Self {
        Self {
            data,
            response: Some(response),
            error: None,
        }
    }

    /// The call failed before a response arrived.
    pub fn failure(error: TransportError) -> Self {
        Self {
            data: None,
            response: None,
            error: Some(error),
        }
    }

    /// Attach an incidental transport error to this outcome.
    pub fn with_error(mut self, error: TransportError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Callback a transport invokes exactly once per call.
pub type TransportCallback = Box<dyn FnOnce(TransportOutcome) + Send + 'static>;

/// The transport's handle on an in-flight call.
pub trait TransportTask: Send + Sync {
    /// Ask the transport to stop the call. Must be safe to call at any time.
    fn cancel(&self);
}

/// A task with nothing to cancel, for transports that complete inline.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompletedTask;

impl TransportTask for CompletedTask {
    fn cancel(&self) {}
}

/// Sends built requests over the network.
pub trait Transport: Send + Sync {
    /// Start sending `request`; `callback` is invoked exactly once, possibly
    /// before this method returns.
    fn send(&self, request: HttpRequest, callback: TransportCallback) -> Box<dyn TransportTask>;
}
