//! Body encoders and response decoders.
//!
//! An [`Endpoint`](super::Endpoint) owns one of each: the encoder turns body
//! parameters into bytes, the decoder turns response bytes into the
//! endpoint's result type.

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::BoxError;

/// Bytes produced by a [`BodyEncoder`] and the content type they imply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBody {
    /// The encoded body.
    pub bytes: Bytes,
    /// The `Content-Type` the encoding implies, if any.
    pub content_type: Option<String>,
}

/// Encodes body parameters into request bytes.
pub trait BodyEncoder: Send + Sync {
    /// Encode `parameters` into a request body.
    fn encode(&self, parameters: &Map<String, Value>) -> Result<EncodedBody, BoxError>;
}

/// Encodes parameters as a JSON object.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonBodyEncoder;

impl BodyEncoder for JsonBodyEncoder {
    fn encode(&self, parameters: &Map<String, Value>) -> Result<EncodedBody, BoxError> {
        Ok(EncodedBody {
            bytes: Bytes::from(serde_json::to_vec(parameters)?),
            content_type: Some("application/json".to_string()),
        })
    }
}

/// Encodes parameters as `application/x-www-form-urlencoded`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormBodyEncoder;

impl BodyEncoder for FormBodyEncoder {
    fn encode(&self, parameters: &Map<String, Value>) -> Result<EncodedBody, BoxError> {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in parameters {
            serializer.append_pair(key, &parameter_string(value));
        }
        Ok(EncodedBody {
            bytes: Bytes::from(serializer.finish()),
            content_type: Some("application/x-www-form-urlencoded".to_string()),
        })
    }
}

/// Render a parameter value the way it appears in a query string or form.
pub(crate) fn parameter_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

/// Decodes response bytes into a typed value.
pub trait ResponseDecoder: Send + Sync {
    /// The decoded type.
    type Output;

    /// Decode a present response body.
    fn decode(&self, data: &[u8]) -> Result<Self::Output, BoxError>;

    /// The value for a response that carried no body.
    ///
    /// `None` means a body is required and its absence is an error.
    fn decode_empty(&self) -> Option<Self::Output> {
        None
    }
}

/// Decodes a JSON body with serde.
pub struct JsonResponseDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonResponseDecoder<T> {
    /// Create a JSON decoder for `T`.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonResponseDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonResponseDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonResponseDecoder")
            .field("output", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> ResponseDecoder for JsonResponseDecoder<T> {
    type Output = T;

    fn decode(&self, data: &[u8]) -> Result<T, BoxError> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Hands back the body bytes untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawDataResponseDecoder;

impl ResponseDecoder for RawDataResponseDecoder {
    type Output = Bytes;

    fn decode(&self, data: &[u8]) -> Result<Bytes, BoxError> {
        Ok(Bytes::copy_from_slice(data))
    }
}

/// For endpoints that declare no payload: any body, or none, is a success.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoContentDecoder;

impl ResponseDecoder for NoContentDecoder {
    type Output = ();

    fn decode(&self, _data: &[u8]) -> Result<(), BoxError> {
        Ok(())
    }

    fn decode_empty(&self) -> Option<()> {
        Some(())
    }
}
