//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;

use courier_net::http::{HttpRequest, HttpResponse, RawResponse};
use courier_net::logging::NetworkLogger;
use courier_net::transport::{
    CompletedTask, Transport, TransportCallback, TransportOutcome, TransportTask,
};
use courier_net::{NetworkConfig, NetworkError, NetworkService, TransportError};

pub const BASE_URL: &str = "https://mock.test.com";

/// Route crate logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("courier_net=trace")
        .with_test_writer()
        .try_init();
}

pub fn config() -> NetworkConfig {
    NetworkConfig::new(BASE_URL)
}

/// Completes every request inline with a fixed outcome.
#[derive(Clone)]
pub struct StubTransport {
    outcome: TransportOutcome,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl StubTransport {
    pub fn new(outcome: TransportOutcome) -> Self {
        Self {
            outcome,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ok(status: u16, body: &'static [u8]) -> Self {
        Self::new(TransportOutcome::response(
            HttpResponse::new(status),
            Some(Bytes::from_static(body)),
        ))
    }

    pub fn ok_without_body(status: u16) -> Self {
        Self::new(TransportOutcome::response(HttpResponse::new(status), None))
    }

    pub fn failing(error: TransportError) -> Self {
        Self::new(TransportOutcome::failure(error))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

impl Transport for StubTransport {
    fn send(&self, request: HttpRequest, callback: TransportCallback) -> Box<dyn TransportTask> {
        self.requests.lock().push(request);
        callback(self.outcome.clone());
        Box::new(CompletedTask)
    }
}

/// Holds every callback until the test fires it.
#[derive(Clone, Default)]
pub struct DeferredTransport {
    callbacks: Arc<Mutex<Vec<TransportCallback>>>,
    cancels: Arc<AtomicUsize>,
}

impl DeferredTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls still waiting.
    pub fn pending(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Number of times a task was cancelled.
    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Fire the oldest waiting callback. Returns `false` if none is waiting.
    pub fn complete_next(&self, outcome: TransportOutcome) -> bool {
        let callback = {
            let mut callbacks = self.callbacks.lock();
            if callbacks.is_empty() {
                return false;
            }
            callbacks.remove(0)
        };
        callback(outcome);
        true
    }
}

struct DeferredTask {
    cancels: Arc<AtomicUsize>,
}

impl TransportTask for DeferredTask {
    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

impl Transport for DeferredTransport {
    fn send(&self, _request: HttpRequest, callback: TransportCallback) -> Box<dyn TransportTask> {
        self.callbacks.lock().push(callback);
        Box::new(DeferredTask {
            cancels: self.cancels.clone(),
        })
    }
}

/// What a [`RecordingLogger`] saw.
#[derive(Clone, Debug)]
pub enum LogEntry {
    Request(String),
    Response(Option<u16>),
    Error(String),
}

/// Records every logger call.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                LogEntry::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl NetworkLogger for RecordingLogger {
    fn log_request(&self, request: &HttpRequest) {
        self.entries.lock().push(LogEntry::Request(request.url.to_string()));
    }

    fn log_response(&self, response: &RawResponse) {
        self.entries.lock().push(LogEntry::Response(response.status()));
    }

    fn log_error(&self, error: &NetworkError) {
        self.entries.lock().push(LogEntry::Error(error.to_string()));
    }
}

/// A service over `transport` with the default test configuration.
pub fn service(transport: impl Transport + 'static) -> NetworkService {
    NetworkService::new(config(), transport)
}

/// Collects results delivered to completions.
pub struct Collector<T> {
    results: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Collector<T> {
    fn clone(&self) -> Self {
        Self {
            results: self.results.clone(),
        }
    }
}

impl<T: Send + 'static> Collector<T> {
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sink(&self) -> impl FnOnce(T) + Send + 'static {
        let results = self.results.clone();
        move |value| results.lock().push(value)
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.results.lock())
    }

    /// The single delivered result. Panics unless exactly one arrived.
    pub fn single(&self) -> T {
        let mut results = self.take();
        assert_eq!(results.len(), 1, "expected exactly one completion");
        results.remove(0)
    }
}
