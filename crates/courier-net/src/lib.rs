//! Data-transfer layer for Courier applications.
//!
//! This crate turns declarative endpoint descriptions into HTTP requests,
//! executes them through a pluggable transport, classifies failures into a
//! closed error taxonomy, and decodes successful payloads into typed values:
//!
//! - **Endpoints**: [`http::Endpoint`] describes one call and its result type
//! - **Network executor**: [`NetworkService`] runs requests and classifies
//!   transport and HTTP-status failures into [`NetworkError`]
//! - **Data transfer**: [`DataTransferService`] decodes bodies and reports
//!   [`DataTransferError`]
//! - **Execution contexts**: [`context`] controls where completions run
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use courier_net::{DataTransferService, NetworkConfig, NetworkService};
//! use courier_net::context::TokioContext;
//! use courier_net::http::{Endpoint, HttpMethod};
//!
//! #[derive(serde::Deserialize)]
//! struct MoviesPage {
//!     page: u32,
//!     total_pages: u32,
//! }
//!
//! let config = NetworkConfig::load("network.toml")?;
//! let network = NetworkService::builder(config).tracing_logger().build()?;
//! let service = DataTransferService::new(network).with_tracing_error_logger();
//!
//! let endpoint = Endpoint::<MoviesPage>::new("3/search/movie", HttpMethod::Get)
//!     .query("query", "batman")
//!     .query("page", 1);
//!
//! // Callback style: exactly one completion, on the chosen context.
//! let handle = service.request(&endpoint, Some(Arc::new(TokioContext::current())), |result| {
//!     match result {
//!         Ok(page) => println!("page {} of {}", page.page, page.total_pages),
//!         Err(err) if err.is_cancelled() => {}
//!         Err(err) => eprintln!("search failed: {err}"),
//!     }
//! });
//!
//! // Cancel if the user typed a new query.
//! handle.cancel();
//!
//! // Async style.
//! let page = service.fetch(&endpoint).await?;
//! ```
//!
//! # Errors
//!
//! [`NetworkError`] covers transport and HTTP-status failures. Error statuses
//! keep the response body so callers can read server-provided details:
//!
//! ```
//! use courier_net::NetworkError;
//!
//! let err = NetworkError::Error { status_code: 401, data: None };
//! assert!(err.has_status_code(401));
//! assert!(!NetworkError::NotConnected.has_status_code(401));
//! ```

pub mod config;
pub mod context;
mod error;
pub mod http;
pub mod logging;
pub mod network;
pub mod runtime;
pub mod transfer;
pub mod transport;

pub use config::NetworkConfig;
pub use error::{
    BoxError, ConfigError, DataTransferError, NetworkError, RequestGenerationError, TransportError,
    TransportErrorKind,
};
pub use network::{CancelGuard, CancellableHandle, NetworkService, NetworkServiceBuilder, RequestId};
pub use transfer::{DataTransferErrorResolver, DataTransferService};
