//! Turning an endpoint into a transport-ready request.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{Map, Value};
use url::Url;

use super::encoding::parameter_string;
use super::endpoint::{EncodedParameters, Endpoint, HttpMethod};
use crate::config::NetworkConfig;
use crate::error::RequestGenerationError;

/// A fully built HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The request URL, query included.
    pub url: Url,
    /// Request headers, names kept as given.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Look up a header value, ignoring the case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl<R> Endpoint<R> {
    /// Build the URL for this endpoint, query string included.
    pub fn url(&self, config: &NetworkConfig) -> Result<Url, RequestGenerationError> {
        let raw = if self.is_full_path {
            self.path.clone()
        } else {
            join_url(config.base_url(), &self.path)
        };

        let mut url = Url::parse(&raw).map_err(|e| RequestGenerationError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        let parameters = resolve_parameters(&self.query_encodable, &self.query_parameters)?;
        if !parameters.is_empty() || !config.query_parameters().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &parameters {
                pairs.append_pair(key, &parameter_string(value));
            }
            for (key, value) in config.query_parameters() {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Build the full request: URL, merged headers and encoded body.
    ///
    /// This is pure; no I/O happens here.
    pub fn to_request(&self, config: &NetworkConfig) -> Result<HttpRequest, RequestGenerationError> {
        let url = self.url(config)?;

        let mut headers: Vec<(String, String)> = Vec::new();
        for (name, value) in config.headers().iter().chain(self.headers.iter()) {
            set_header(&mut headers, name, value);
        }

        let parameters = resolve_parameters(&self.body_encodable, &self.body_parameters)?;
        let body = if parameters.is_empty() {
            None
        } else {
            let encoded = self
                .body_encoder
                .encode(&parameters)
                .map_err(|e| RequestGenerationError::Body(e.to_string()))?;
            if let Some(content_type) = encoded.content_type
                && !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            {
                headers.push(("Content-Type".to_string(), content_type));
            }
            Some(encoded.bytes)
        };

        for (name, value) in &headers {
            validate_header(name, value)?;
        }

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }
}

/// Join a base URL and a relative path with exactly one `/`.
fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Pick the object form over the map form.
fn resolve_parameters(
    encodable: &Option<EncodedParameters>,
    map: &BTreeMap<String, Value>,
) -> Result<Map<String, Value>, RequestGenerationError> {
    match encodable {
        Some(Ok(Value::Object(object))) => Ok(object.clone()),
        Some(Ok(Value::Null)) => Ok(Map::new()),
        Some(Ok(other)) => Err(RequestGenerationError::Parameters(format!(
            "expected an object, got {other}"
        ))),
        Some(Err(message)) => Err(RequestGenerationError::Parameters(message.clone())),
        None => Ok(map
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()),
    }
}

/// Insert or replace a header, comparing names case-insensitively.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
        Some(entry) => *entry = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), RequestGenerationError> {
    let valid = http::HeaderName::from_bytes(name.as_bytes()).is_ok()
        && http::HeaderValue::from_str(value).is_ok();
    if valid {
        Ok(())
    } else {
        Err(RequestGenerationError::InvalidHeader {
            name: name.to_string(),
        })
    }
}
