//! The network executor.
//!
//! [`NetworkService`] builds a request from an endpoint, hands it to the
//! injected [`Transport`], and classifies what comes back into either a
//! [`RawResponse`] or a [`NetworkError`]. Each call returns a
//! [`CancellableHandle`] immediately and completes exactly once.
//!
//! # Classification
//!
//! - A response with status 400 or above is `NetworkError::Error`, carrying
//!   the body, whatever the transport error says.
//! - A response below 400 is a success, even with an incidental transport
//!   error.
//! - Without a response, the transport error kind decides: cancellation,
//!   connectivity loss, or a generic failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::config::NetworkConfig;
use crate::error::{NetworkError, TransportError};
use crate::http::{Endpoint, HttpRequest, RawResponse};
use crate::logging::{NetworkLogger, TracingNetworkLogger, targets};
use crate::transport::{ReqwestTransport, Transport, TransportOutcome, TransportTask};

/// Completion callback for [`NetworkService`] calls.
pub type NetworkCompletion = Box<dyn FnOnce(Result<RawResponse, NetworkError>) + Send + 'static>;

/// Unique identifier for a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// State shared between a handle and its transport callback.
struct PendingRequest {
    id: RequestId,
    completion: Option<NetworkCompletion>,
    task: Option<Box<dyn TransportTask>>,
    logger: Option<Arc<dyn NetworkLogger>>,
}

/// A handle to an in-flight request that can be cancelled.
///
/// Whichever happens first, cancellation or completion, wins; the other
/// side becomes a no-op. Cancelling a finished request does nothing.
#[derive(Clone)]
pub struct CancellableHandle {
    id: RequestId,
    pending: Option<Arc<Mutex<PendingRequest>>>,
}

impl CancellableHandle {
    /// A handle for a request that already finished.
    pub(crate) fn completed(id: RequestId) -> Self {
        Self { id, pending: None }
    }

    /// The request's identifier.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Cancel the pending request.
    ///
    /// The request completes with [`NetworkError::Cancelled`]. Returns `true`
    /// if this call cancelled it, `false` if it had already finished.
    pub fn cancel(&self) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };

        let (completion, task, logger) = {
            let mut state = pending.lock();
            let Some(completion) = state.completion.take() else {
                return false;
            };
            (completion, state.task.take(), state.logger.clone())
        };

        tracing::debug!(target: targets::NETWORK, request_id = self.id.0, "cancelling request");
        if let Some(task) = task {
            task.cancel();
        }
        let error = NetworkError::Cancelled;
        if let Some(logger) = logger {
            logger.log_error(&error);
        }
        completion(Err(error));
        true
    }

    /// Check if the request is still pending.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.lock().completion.is_some())
    }

    /// Wrap the handle so the request is cancelled when the guard is dropped.
    pub fn cancel_on_drop(self) -> CancelGuard {
        CancelGuard(self)
    }
}

impl std::fmt::Debug for CancellableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellableHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Cancels its request on drop unless it already finished.
#[derive(Debug)]
pub struct CancelGuard(CancellableHandle);

impl CancelGuard {
    /// The guarded handle.
    pub fn handle(&self) -> &CancellableHandle {
        &self.0
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Classify what a transport reported.
pub fn classify(outcome: TransportOutcome) -> Result<RawResponse, NetworkError> {
    let TransportOutcome {
        data,
        response,
        error,
    } = outcome;

    match response {
        Some(response) if response.is_error() => Err(NetworkError::Error {
            status_code: response.status(),
            data,
        }),
        Some(response) => {
            if let Some(error) = error {
                tracing::trace!(
                    target: targets::NETWORK,
                    status = response.status(),
                    %error,
                    "transport error ignored for non-error status"
                );
            }
            Ok(RawResponse {
                data,
                response: Some(response),
            })
        }
        None => match error {
            Some(error) => Err(NetworkError::from(error)),
            None => Ok(RawResponse {
                data,
                response: None,
            }),
        },
    }
}

struct NetworkServiceInner {
    config: NetworkConfig,
    transport: Arc<dyn Transport>,
    logger: Option<Arc<dyn NetworkLogger>>,
}

/// Builder for creating a [`NetworkService`].
pub struct NetworkServiceBuilder {
    config: NetworkConfig,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<Arc<dyn NetworkLogger>>,
}

impl NetworkServiceBuilder {
    /// Create a builder for the given configuration.
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            transport: None,
            logger: None,
        }
    }

    /// Use this transport. Defaults to [`ReqwestTransport`].
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use a shared transport.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Log requests, responses and errors with this logger.
    pub fn logger(mut self, logger: impl NetworkLogger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Log with [`TracingNetworkLogger`].
    pub fn tracing_logger(self) -> Self {
        self.logger(TracingNetworkLogger)
    }

    /// Build the service.
    pub fn build(self) -> Result<NetworkService, TransportError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(NetworkService {
            inner: Arc::new(NetworkServiceInner {
                config: self.config,
                transport,
                logger: self.logger,
            }),
        })
    }
}

/// Executes endpoints through a transport and classifies the outcome.
///
/// The service is cheaply cloneable and can run many requests concurrently.
///
/// # Example
///
/// ```ignore
/// use courier_net::{NetworkConfig, NetworkService};
/// use courier_net::http::{Endpoint, HttpMethod};
///
/// let service = NetworkService::builder(NetworkConfig::new("https://api.example.com"))
///     .tracing_logger()
///     .build()?;
///
/// let handle = service.request(&Endpoint::raw("health", HttpMethod::Get), |result| {
///     match result {
///         Ok(raw) => println!("status {:?}", raw.status()),
///         Err(err) => println!("failed: {err}"),
///     }
/// });
/// ```
#[derive(Clone)]
pub struct NetworkService {
    inner: Arc<NetworkServiceInner>,
}

impl NetworkService {
    /// Create a service with the given transport and no logger.
    pub fn new(config: NetworkConfig, transport: impl Transport + 'static) -> Self {
        Self {
            inner: Arc::new(NetworkServiceInner {
                config,
                transport: Arc::new(transport),
                logger: None,
            }),
        }
    }

    /// Create a builder for configuring a new service.
    pub fn builder(config: NetworkConfig) -> NetworkServiceBuilder {
        NetworkServiceBuilder::new(config)
    }

    /// The configuration requests are built against.
    pub fn config(&self) -> &NetworkConfig {
        &self.inner.config
    }

    /// Build and execute `endpoint`.
    ///
    /// If the request cannot be built, `completion` receives
    /// [`NetworkError::UrlGeneration`] before this returns and the handle is
    /// already finished.
    pub fn request<R, F>(&self, endpoint: &Endpoint<R>, completion: F) -> CancellableHandle
    where
        F: FnOnce(Result<RawResponse, NetworkError>) + Send + 'static,
    {
        match endpoint.to_request(&self.inner.config) {
            Ok(request) => self.execute(request, completion),
            Err(err) => {
                let error = NetworkError::UrlGeneration(err);
                if let Some(logger) = &self.inner.logger {
                    logger.log_error(&error);
                }
                completion(Err(error));
                CancellableHandle::completed(RequestId::new())
            }
        }
    }

    /// Execute an already built request.
    pub fn execute<F>(&self, request: HttpRequest, completion: F) -> CancellableHandle
    where
        F: FnOnce(Result<RawResponse, NetworkError>) + Send + 'static,
    {
        let id = RequestId::new();
        let logger = self.inner.logger.clone();
        let pending = Arc::new(Mutex::new(PendingRequest {
            id,
            completion: Some(Box::new(completion)),
            task: None,
            logger: logger.clone(),
        }));

        if let Some(logger) = &logger {
            logger.log_request(&request);
        }

        let callback_state = pending.clone();
        let task = self.inner.transport.send(
            request,
            Box::new(move |outcome| finish(&callback_state, outcome)),
        );

        {
            let mut state = pending.lock();
            if state.completion.is_some() {
                state.task = Some(task);
            }
        }

        CancellableHandle {
            id,
            pending: Some(pending),
        }
    }
}

impl std::fmt::Debug for NetworkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkService")
            .field("config", &self.inner.config)
            .field("has_logger", &self.inner.logger.is_some())
            .finish()
    }
}

/// Transport callback: classify, log, and complete unless cancelled first.
fn finish(pending: &Mutex<PendingRequest>, outcome: TransportOutcome) {
    let (id, completion, logger) = {
        let mut state = pending.lock();
        state.task = None;
        (state.id, state.completion.take(), state.logger.clone())
    };

    let Some(completion) = completion else {
        tracing::trace!(target: targets::NETWORK, request_id = id.0, "late transport callback ignored");
        return;
    };

    let result = classify(outcome);
    if let Some(logger) = logger {
        match &result {
            Ok(response) => logger.log_response(response),
            Err(error) => logger.log_error(error),
        }
    }
    completion(result);
}
