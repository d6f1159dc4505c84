//! Tests for the data transfer service: decoding, error resolution and
//! completion delivery.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;

use common::{Collector, DeferredTransport, StubTransport};
use courier_net::context::{ExecutionContext, MainQueue, TokioContext};
use courier_net::http::{Endpoint, HttpMethod, HttpResponse};
use courier_net::logging::DataTransferErrorLogger;
use courier_net::transport::TransportOutcome;
use courier_net::{BoxError, DataTransferError, DataTransferService, NetworkError};

#[derive(Debug, Deserialize, PartialEq)]
struct MockModel {
    name: String,
}

type TransferResult<T> = Result<T, DataTransferError>;

fn model_endpoint() -> Endpoint<MockModel> {
    Endpoint::new("http://mock.endpoint.com", HttpMethod::Get).full_path(true)
}

#[derive(Debug, thiserror::Error)]
#[error("session expired")]
struct SessionExpired;

#[derive(Clone, Default)]
struct CountingErrorLogger {
    count: Arc<AtomicUsize>,
}

impl DataTransferErrorLogger for CountingErrorLogger {
    fn log(&self, _error: &(dyn std::error::Error + 'static)) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_valid_json_decodes_into_object() {
    let service = DataTransferService::new(common::service(StubTransport::ok(
        200,
        br#"{"name": "Hello"}"#,
    )));
    let results = Collector::<TransferResult<MockModel>>::new();

    service.request(&model_endpoint(), None, results.sink());

    let model = results.single().expect("Should decode mock object");
    assert_eq!(model.name, "Hello");
}

#[test]
fn test_missing_body_is_no_response() {
    let service = DataTransferService::new(common::service(StubTransport::ok_without_body(200)));
    let results = Collector::<TransferResult<MockModel>>::new();

    service.request(&model_endpoint(), None, results.sink());

    assert!(matches!(results.single(), Err(DataTransferError::NoResponse)));
}

#[test]
fn test_no_content_endpoint_accepts_missing_body() {
    let service = DataTransferService::new(common::service(StubTransport::ok_without_body(204)));
    let results = Collector::<TransferResult<()>>::new();

    service.request(
        &Endpoint::no_content("http://mock.endpoint.com", HttpMethod::Delete).full_path(true),
        None,
        results.sink(),
    );

    results.single().expect("No-content endpoint should succeed");
}

#[test]
fn test_invalid_json_is_parsing_error() {
    let logger = CountingErrorLogger::default();
    let service = DataTransferService::new(common::service(StubTransport::ok(
        200,
        br#"{"age": 20}"#,
    )))
    .with_error_logger(logger.clone());
    let results = Collector::<TransferResult<MockModel>>::new();

    service.request(&model_endpoint(), None, results.sink());

    match results.single() {
        Err(DataTransferError::Parsing(err)) => {
            assert!(err.downcast_ref::<serde_json::Error>().is_some());
        }
        other => panic!("should not decode mock object, got {other:?}"),
    }
    assert_eq!(logger.count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_bad_status_is_network_failure() {
    let service = DataTransferService::new(common::service(StubTransport::ok(
        500,
        br#"{"invalidStructure": "Nothing"}"#,
    )));
    let results = Collector::<TransferResult<MockModel>>::new();

    service.request(&model_endpoint(), None, results.sink());

    match results.single() {
        Err(DataTransferError::NetworkFailure(NetworkError::Error { status_code, data })) => {
            assert_eq!(status_code, 500);
            assert!(data.is_some());
        }
        other => panic!("should return network failure, got {other:?}"),
    }
}

#[test]
fn test_resolver_replaces_network_error() {
    let service = DataTransferService::new(common::service(StubTransport::ok(401, b"")))
        .with_error_resolver(|error: &NetworkError| -> Option<BoxError> {
            error.has_status_code(401).then(|| Box::new(SessionExpired) as BoxError)
        });
    let results = Collector::<TransferResult<MockModel>>::new();

    service.request(&model_endpoint(), None, results.sink());

    match results.single() {
        Err(DataTransferError::ResolvedNetworkFailure(err)) => {
            assert!(err.downcast_ref::<SessionExpired>().is_some());
        }
        other => panic!("should return resolved failure, got {other:?}"),
    }
}

#[test]
fn test_resolver_may_pass_error_through() {
    let service = DataTransferService::new(common::service(StubTransport::ok(404, b"")))
        .with_error_resolver(|_: &NetworkError| -> Option<BoxError> { None });
    let results = Collector::<TransferResult<MockModel>>::new();

    service.request(&model_endpoint(), None, results.sink());

    let err = results.single().unwrap_err();
    assert!(err.network_error().is_some_and(NetworkError::is_not_found));
}

#[test]
fn test_cancellation_bypasses_resolver() {
    let resolved = Arc::new(AtomicUsize::new(0));
    let counter = resolved.clone();
    let transport = DeferredTransport::new();
    let service = DataTransferService::new(common::service(transport.clone())).with_error_resolver(
        move |_: &NetworkError| -> Option<BoxError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(Box::new(SessionExpired))
        },
    );
    let results = Collector::<TransferResult<MockModel>>::new();

    let handle = service.request(&model_endpoint(), None, results.sink());
    handle.cancel();

    let err = results.single().unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(resolved.load(Ordering::SeqCst), 0);
}

#[test]
fn test_url_generation_error_is_delivered_through_context() {
    let service = DataTransferService::new(common::service(StubTransport::ok(200, b"")));
    let queue = Arc::new(MainQueue::new());
    let results = Collector::<TransferResult<MockModel>>::new();

    service.request(
        &Endpoint::<MockModel>::new("::bad::", HttpMethod::Get).full_path(true),
        Some(queue.clone()),
        results.sink(),
    );

    assert_eq!(results.len(), 0);
    assert_eq!(queue.run_pending(), 1);
    assert!(matches!(
        results.single(),
        Err(DataTransferError::NetworkFailure(NetworkError::UrlGeneration(_)))
    ));
}

#[test]
fn test_exactly_one_completion_on_main_queue() {
    let transport = DeferredTransport::new();
    let service = DataTransferService::new(common::service(transport.clone()));
    let queue = Arc::new(MainQueue::new());
    let results = Collector::<TransferResult<MockModel>>::new();

    let handle = service.request(&model_endpoint(), Some(queue.clone()), results.sink());
    handle.cancel();
    transport.complete_next(TransportOutcome::response(
        HttpResponse::new(200),
        Some(br#"{"name": "late"}"#.as_slice().into()),
    ));

    assert_eq!(queue.run_pending(), 1);
    assert!(results.single().unwrap_err().is_cancelled());
}

#[test]
fn test_completion_runs_on_worker_queue_thread() {
    let transport = DeferredTransport::new();
    let service = DataTransferService::new(common::service(transport.clone()));
    let queue = Arc::new(MainQueue::new());
    let results = Collector::<TransferResult<MockModel>>::new();

    service.request(&model_endpoint(), Some(queue.clone()), results.sink());

    let fire = std::thread::spawn(move || {
        transport.complete_next(TransportOutcome::response(
            HttpResponse::new(200),
            Some(br#"{"name": "Hello"}"#.as_slice().into()),
        ))
    });
    assert!(fire.join().expect("transport thread panicked"));

    assert_eq!(results.len(), 0);
    assert!(queue.run_next(Duration::from_secs(1)));
    assert_eq!(results.single().expect("Should decode").name, "Hello");
}

#[tokio::test]
async fn test_fetch_returns_decoded_value() {
    let service = DataTransferService::new(common::service(StubTransport::ok(
        200,
        br#"{"name": "Hello"}"#,
    )));

    let model = service.fetch(&model_endpoint()).await.expect("Should decode");

    assert_eq!(model, MockModel { name: "Hello".into() });
}

#[tokio::test]
async fn test_dropping_fetch_cancels_request() {
    let transport = DeferredTransport::new();
    let service = DataTransferService::new(common::service(transport.clone()));

    let endpoint = model_endpoint();
    let result = tokio::time::timeout(Duration::from_millis(20), service.fetch(&endpoint)).await;

    assert!(result.is_err());
    assert_eq!(transport.cancels(), 1);
}

#[tokio::test]
async fn test_tokio_context_delivery() {
    let service = DataTransferService::new(common::service(StubTransport::ok(
        200,
        br#"{"name": "Hello"}"#,
    )));
    let (tx, rx) = tokio::sync::oneshot::channel();
    let context: Arc<dyn ExecutionContext> = Arc::new(TokioContext::current());

    service.request(&model_endpoint(), Some(context), move |result| {
        let _ = tx.send(result);
    });

    let model = rx.await.expect("completion dropped").expect("Should decode");
    assert_eq!(model.name, "Hello");
}
