//! The data transfer service: network calls that end in typed values.
//!
//! [`DataTransferService`] wraps a [`NetworkService`], decodes successful
//! bodies with the endpoint's decoder, and delivers exactly one result per
//! request on the caller's [`ExecutionContext`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use courier_net::{DataTransferService, NetworkConfig, NetworkService};
//! use courier_net::context::MainQueue;
//! use courier_net::http::{Endpoint, HttpMethod};
//!
//! let network = NetworkService::builder(NetworkConfig::new("https://api.example.com"))
//!     .tracing_logger()
//!     .build()?;
//! let service = DataTransferService::new(network);
//! let main = Arc::new(MainQueue::new());
//!
//! let endpoint = Endpoint::<MoviesPage>::new("3/search/movie", HttpMethod::Get)
//!     .query("query", "batman");
//! let handle = service.request(&endpoint, Some(main.clone()), |result| {
//!     // Runs when the UI loop drains `main`.
//! });
//! ```

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::context::{ExecutionContext, deliver};
use crate::error::{BoxError, DataTransferError, NetworkError};
use crate::http::{Endpoint, ResponseDecoder};
use crate::logging::{DataTransferErrorLogger, TracingTransferErrorLogger};
use crate::network::{CancellableHandle, NetworkService};

/// Gives callers a chance to replace network failures with their own error.
pub trait DataTransferErrorResolver: Send + Sync {
    /// Return a substitute error, or `None` to pass `error` through.
    fn resolve(&self, error: &NetworkError) -> Option<BoxError>;
}

impl<F> DataTransferErrorResolver for F
where
    F: Fn(&NetworkError) -> Option<BoxError> + Send + Sync,
{
    fn resolve(&self, error: &NetworkError) -> Option<BoxError> {
        self(error)
    }
}

/// Requests endpoints and decodes their responses.
///
/// Cheap to clone; clones share the network service and hooks.
#[derive(Clone)]
pub struct DataTransferService {
    network: NetworkService,
    resolver: Option<Arc<dyn DataTransferErrorResolver>>,
    error_logger: Option<Arc<dyn DataTransferErrorLogger>>,
}

impl DataTransferService {
    /// Wrap a network service, with no resolver and no error logger.
    pub fn new(network: NetworkService) -> Self {
        Self {
            network,
            resolver: None,
            error_logger: None,
        }
    }

    /// Resolve network failures with `resolver`.
    pub fn with_error_resolver(mut self, resolver: impl DataTransferErrorResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Report network and decoding failures to `logger`.
    pub fn with_error_logger(mut self, logger: impl DataTransferErrorLogger + 'static) -> Self {
        self.error_logger = Some(Arc::new(logger));
        self
    }

    /// Report failures with [`TracingTransferErrorLogger`].
    pub fn with_tracing_error_logger(self) -> Self {
        self.with_error_logger(TracingTransferErrorLogger)
    }

    /// The wrapped network service.
    pub fn network(&self) -> &NetworkService {
        &self.network
    }

    /// Request `endpoint` and decode the response.
    ///
    /// `completion` runs exactly once, through `context` when one is given
    /// (even for failures detected before any I/O), otherwise inline on
    /// whichever thread finished the request.
    pub fn request<R, F>(
        &self,
        endpoint: &Endpoint<R>,
        context: Option<Arc<dyn ExecutionContext>>,
        completion: F,
    ) -> CancellableHandle
    where
        R: Send + 'static,
        F: FnOnce(Result<R, DataTransferError>) + Send + 'static,
    {
        let decoder = endpoint.decoder();
        let this = self.clone();

        self.network.request(endpoint, move |result| {
            let result = match result {
                Ok(raw) => this.decode(&*decoder, raw.data),
                Err(error) => Err(this.resolve(error)),
            };
            deliver(context.as_deref(), move || completion(result));
        })
    }

    /// Request `endpoint` and await the decoded response.
    ///
    /// Dropping the returned future cancels the request.
    pub async fn fetch<R>(&self, endpoint: &Endpoint<R>) -> Result<R, DataTransferError>
    where
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let guard = self
            .request(endpoint, None, move |result| {
                let _ = tx.send(result);
            })
            .cancel_on_drop();

        let result = rx
            .await
            .unwrap_or(Err(DataTransferError::NetworkFailure(NetworkError::Cancelled)));
        drop(guard);
        result
    }

    fn decode<R>(
        &self,
        decoder: &dyn ResponseDecoder<Output = R>,
        data: Option<Bytes>,
    ) -> Result<R, DataTransferError> {
        let Some(data) = data else {
            return decoder.decode_empty().ok_or(DataTransferError::NoResponse);
        };

        decoder.decode(&data).map_err(|err| {
            if let Some(logger) = &self.error_logger {
                logger.log(&*err);
            }
            DataTransferError::Parsing(err)
        })
    }

    fn resolve(&self, error: NetworkError) -> DataTransferError {
        if let Some(logger) = &self.error_logger {
            logger.log(&error);
        }

        if error.is_cancelled() {
            return DataTransferError::NetworkFailure(error);
        }

        match self.resolver.as_ref().and_then(|resolver| resolver.resolve(&error)) {
            Some(resolved) => DataTransferError::ResolvedNetworkFailure(resolved),
            None => DataTransferError::NetworkFailure(error),
        }
    }
}

impl std::fmt::Debug for DataTransferService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTransferService")
            .field("network", &self.network)
            .field("has_resolver", &self.resolver.is_some())
            .field("has_error_logger", &self.error_logger.is_some())
            .finish()
    }
}
