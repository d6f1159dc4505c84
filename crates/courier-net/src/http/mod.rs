//! HTTP building blocks: endpoints, request construction, responses and
//! body codecs.
//!
//! # Example
//!
//! ```
//! use courier_net::NetworkConfig;
//! use courier_net::http::{Endpoint, FormBodyEncoder, HttpMethod};
//!
//! let config = NetworkConfig::new("https://api.example.com")
//!     .with_header("Accept", "application/json");
//!
//! let endpoint = Endpoint::no_content("sessions", HttpMethod::Post)
//!     .body("username", "john")
//!     .body_encoder(FormBodyEncoder);
//!
//! let request = endpoint.to_request(&config).unwrap();
//! assert_eq!(request.url.as_str(), "https://api.example.com/sessions");
//! assert_eq!(request.header("content-type"), Some("application/x-www-form-urlencoded"));
//! ```

mod encoding;
mod endpoint;
mod request;
mod response;

pub use encoding::{
    BodyEncoder, EncodedBody, FormBodyEncoder, JsonBodyEncoder, JsonResponseDecoder,
    NoContentDecoder, RawDataResponseDecoder, ResponseDecoder,
};
pub use endpoint::{Endpoint, HttpMethod};
pub use request::HttpRequest;
pub use response::{HttpResponse, RawResponse};
