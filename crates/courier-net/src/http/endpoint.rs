//! Declarative endpoint descriptors.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::encoding::{
    BodyEncoder, JsonBodyEncoder, JsonResponseDecoder, NoContentDecoder, RawDataResponseDecoder,
    ResponseDecoder,
};

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP HEAD method.
    Head,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP PATCH method.
    Patch,
    /// HTTP DELETE method.
    Delete,
    /// HTTP OPTIONS method.
    Options,
}

impl HttpMethod {
    /// The method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }

    /// Convert to reqwest method.
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Head => reqwest::Method::HEAD,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object-form parameters, serialized when they are set.
///
/// A serialization failure is kept and reported when the request is built.
pub(crate) type EncodedParameters = std::result::Result<Value, String>;

/// Describes one HTTP call and how to decode its response into `R`.
///
/// Endpoints are built with chained methods and are not modified once handed
/// to a service. Cloning is cheap: encoders and decoders are shared.
///
/// # Example
///
/// ```
/// use courier_net::http::{Endpoint, HttpMethod};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct MoviesPage {
///     page: u32,
/// }
///
/// let endpoint = Endpoint::<MoviesPage>::new("3/search/movie", HttpMethod::Get)
///     .query("query", "batman")
///     .query("page", 1);
///
/// assert_eq!(endpoint.path(), "3/search/movie");
/// ```
pub struct Endpoint<R> {
    pub(crate) path: String,
    pub(crate) is_full_path: bool,
    pub(crate) method: HttpMethod,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) query_encodable: Option<EncodedParameters>,
    pub(crate) query_parameters: BTreeMap<String, Value>,
    pub(crate) body_encodable: Option<EncodedParameters>,
    pub(crate) body_parameters: BTreeMap<String, Value>,
    pub(crate) body_encoder: Arc<dyn BodyEncoder>,
    pub(crate) decoder: Arc<dyn ResponseDecoder<Output = R>>,
}

impl<R: DeserializeOwned + 'static> Endpoint<R> {
    /// Create an endpoint whose response is decoded from JSON.
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self::with_decoder(path, method, JsonResponseDecoder::<R>::new())
    }
}

impl Endpoint<()> {
    /// Create an endpoint that expects no payload.
    ///
    /// A success without a body is not an error for these endpoints.
    pub fn no_content(path: impl Into<String>, method: HttpMethod) -> Self {
        Self::with_decoder(path, method, NoContentDecoder)
    }
}

impl Endpoint<Bytes> {
    /// Create an endpoint that hands back the raw body bytes.
    pub fn raw(path: impl Into<String>, method: HttpMethod) -> Self {
        Self::with_decoder(path, method, RawDataResponseDecoder)
    }
}

impl<R> Endpoint<R> {
    /// Create an endpoint with a custom response decoder.
    pub fn with_decoder<D>(path: impl Into<String>, method: HttpMethod, decoder: D) -> Self
    where
        D: ResponseDecoder<Output = R> + 'static,
    {
        Self {
            path: path.into(),
            is_full_path: false,
            method,
            headers: BTreeMap::new(),
            query_encodable: None,
            query_parameters: BTreeMap::new(),
            body_encodable: None,
            body_parameters: BTreeMap::new(),
            body_encoder: Arc::new(JsonBodyEncoder),
            decoder: Arc::new(decoder),
        }
    }

    /// Use the path verbatim instead of joining it onto the base URL.
    pub fn full_path(mut self, is_full_path: bool) -> Self {
        self.is_full_path = is_full_path;
        self
    }

    /// Add a header. It replaces a default header of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a scalar query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_parameters.insert(key.into(), value.into());
        self
    }

    /// Set the query parameters from a serializable object.
    ///
    /// When set, it takes precedence over parameters added with [`query`](Self::query).
    pub fn query_encodable<T: Serialize>(mut self, value: &T) -> Self {
        self.query_encodable = Some(serde_json::to_value(value).map_err(|e| e.to_string()));
        self
    }

    /// Add a scalar body parameter.
    pub fn body(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body_parameters.insert(key.into(), value.into());
        self
    }

    /// Set the body parameters from a serializable object.
    ///
    /// When set, it takes precedence over parameters added with [`body`](Self::body).
    pub fn body_encodable<T: Serialize>(mut self, value: &T) -> Self {
        self.body_encodable = Some(serde_json::to_value(value).map_err(|e| e.to_string()));
        self
    }

    /// Set the encoder used for body parameters. Defaults to JSON.
    pub fn body_encoder(mut self, encoder: impl BodyEncoder + 'static) -> Self {
        self.body_encoder = Arc::new(encoder);
        self
    }

    /// The path, absolute or relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the path is used verbatim.
    pub fn is_full_path(&self) -> bool {
        self.is_full_path
    }

    /// The HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Per-endpoint headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The response decoder.
    pub fn decoder(&self) -> Arc<dyn ResponseDecoder<Output = R>> {
        self.decoder.clone()
    }
}

impl<R> Clone for Endpoint<R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            is_full_path: self.is_full_path,
            method: self.method,
            headers: self.headers.clone(),
            query_encodable: self.query_encodable.clone(),
            query_parameters: self.query_parameters.clone(),
            body_encodable: self.body_encodable.clone(),
            body_parameters: self.body_parameters.clone(),
            body_encoder: self.body_encoder.clone(),
            decoder: self.decoder.clone(),
        }
    }
}

impl<R> fmt::Debug for Endpoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("is_full_path", &self.is_full_path)
            .field("headers", &self.headers)
            .field("query_parameters", &self.query_parameters)
            .field("body_parameters", &self.body_parameters)
            .field("output", &std::any::type_name::<R>())
            .finish()
    }
}
