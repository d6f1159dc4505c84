//! Production transport backed by reqwest.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::redirect::Policy;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use super::{Transport, TransportCallback, TransportOutcome, TransportTask};
use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpRequest, HttpResponse};
use crate::logging::targets;

/// Configuration for the reqwest client.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// Default user agent.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
    /// Whether to keep cookies between requests.
    pub cookies_enabled: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            follow_redirects: true,
            max_redirects: 10,
            user_agent: Some(format!("courier-net/{}", env!("CARGO_PKG_VERSION"))),
            proxy: None,
            cookies_enabled: true,
        }
    }
}

/// Builder for creating a [`ReqwestTransport`].
#[derive(Default)]
pub struct ReqwestTransportBuilder {
    config: TransportConfig,
    runtime: Option<Handle>,
}

impl ReqwestTransportBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Disable redirect following.
    pub fn no_redirects(mut self) -> Self {
        self.config.follow_redirects = false;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set a proxy URL.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Disable cookie storage.
    pub fn no_cookies(mut self) -> Self {
        self.config.cookies_enabled = false;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Run requests on this runtime instead of the current or shared one.
    ///
    /// Requests sent after `handle`'s runtime shuts down fail with
    /// [`TransportErrorKind::Other`].
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if self.config.follow_redirects {
            builder = builder.redirect(Policy::limited(self.config.max_redirects));
        } else {
            builder = builder.redirect(Policy::none());
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        if self.config.cookies_enabled {
            builder = builder.cookie_store(true);
        }

        if let Some(ref proxy_url) = self.config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| TransportError::other(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::other(e.to_string()))?;

        Ok(ReqwestTransport {
            inner: Arc::new(ReqwestTransportInner {
                client,
                config: self.config,
                runtime: self.runtime,
            }),
        })
    }
}

struct ReqwestTransportInner {
    client: reqwest::Client,
    config: TransportConfig,
    runtime: Option<Handle>,
}

/// A [`Transport`] that executes requests with reqwest on a tokio runtime.
///
/// The transport is cheaply cloneable; clones share the connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<ReqwestTransportInner>,
}

impl ReqwestTransport {
    /// Create a transport with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    /// Create a builder for configuring a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// Get the transport's configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest, callback: TransportCallback) -> Box<dyn TransportTask> {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let client = self.inner.client.clone();
        let runtime = self
            .inner
            .runtime
            .clone()
            .unwrap_or_else(crate::runtime::handle);
        let callback = CallbackGuard(Some(callback));

        runtime.spawn(async move {
            // A dropped sender disables the cancel branch instead of firing it.
            let outcome = tokio::select! {
                outcome = execute(&client, request) => outcome,
                Ok(()) = cancel_rx => TransportOutcome::failure(TransportError::cancelled()),
            };
            callback.complete(outcome);
        });

        Box::new(ReqwestTask {
            cancel_tx: Mutex::new(Some(cancel_tx)),
        })
    }
}

/// Reports a failure if the spawned call is dropped before it calls back,
/// as happens when its runtime shuts down.
struct CallbackGuard(Option<TransportCallback>);

impl CallbackGuard {
    fn complete(mut self, outcome: TransportOutcome) {
        if let Some(callback) = self.0.take() {
            callback(outcome);
        }
    }
}

impl Drop for CallbackGuard {
    fn drop(&mut self) {
        if let Some(callback) = self.0.take() {
            tracing::debug!(target: targets::TRANSPORT, "transport task dropped before completion");
            callback(TransportOutcome::failure(TransportError::other(
                "transport task dropped",
            )));
        }
    }
}

/// Handle on a spawned reqwest call.
struct ReqwestTask {
    cancel_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl TransportTask for ReqwestTask {
    fn cancel(&self) {
        if let Some(tx) = self.cancel_tx.lock().take() {
            let _ = tx.send(());
        }
    }
}

async fn execute(client: &reqwest::Client, request: HttpRequest) -> TransportOutcome {
    let mut builder = client.request(request.method.to_reqwest(), request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body {
        builder = builder.body(body);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(err) => return TransportOutcome::failure(transport_error(&err)),
    };

    let meta = HttpResponse::with_headers(response.status().as_u16(), response.headers().clone());
    match response.bytes().await {
        Ok(bytes) => TransportOutcome::response(meta, Some(bytes)),
        Err(err) => {
            tracing::debug!(target: targets::TRANSPORT, "Failed to read response body: {}", err);
            TransportOutcome::response(meta, None).with_error(transport_error(&err))
        }
    }
}

/// Map a reqwest failure to its transport error kind.
fn transport_error(err: &reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::TimedOut
    } else if is_network_unreachable(err) {
        TransportErrorKind::NotConnected
    } else if err.is_connect() {
        TransportErrorKind::Connection
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, err.to_string())
}

/// Walk the source chain looking for an I/O error that means "no route".
fn is_network_unreachable(err: &reqwest::Error) -> bool {
    use std::io::ErrorKind;

    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>()
            && matches!(
                io.kind(),
                ErrorKind::NetworkDown | ErrorKind::NetworkUnreachable | ErrorKind::HostUnreachable
            )
        {
            return true;
        }
        source = cause.source();
    }
    false
}
