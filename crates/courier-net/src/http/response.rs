//! HTTP response types.

use bytes::Bytes;

/// Response metadata reported by a transport: status line and headers.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    status: u16,
    headers: http::HeaderMap,
}

impl HttpResponse {
    /// Create response metadata with no headers.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: http::HeaderMap::new(),
        }
    }

    /// Create response metadata with headers.
    pub fn with_headers(status: u16, headers: http::HeaderMap) -> Self {
        Self { status, headers }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the status denotes a client or server error (400 and above).
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Get the response headers.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the Content-Type header value.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// The result of a successful network call: body bytes plus metadata.
///
/// Produced once per request and consumed by decoding.
#[derive(Clone, Debug, Default)]
pub struct RawResponse {
    /// The response body, if the transport delivered one.
    pub data: Option<Bytes>,
    /// The response metadata, if the transport delivered any.
    pub response: Option<HttpResponse>,
}

impl RawResponse {
    /// Get the HTTP status code, if known.
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(HttpResponse::status)
    }

    /// Length of the body in bytes, zero when absent.
    pub fn body_len(&self) -> usize {
        self.data.as_ref().map_or(0, Bytes::len)
    }
}
