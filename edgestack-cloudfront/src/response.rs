//! Handler response model and writer
//!
//! Handlers return the CloudFront response shape with every field optional;
//! absent fields leave the HTTP defaults in place (200, no extra headers,
//! empty body).

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use hyper::Response;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body;
use crate::headers::{self, EdgeHeaders};

/// Normalized handler response, matching the platform wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResponse {
    /// Status code as a numeric string, e.g. `"200"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Reason phrase; carried on the wire but not written, hyper does not
    /// expose the HTTP/1.1 reason phrase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<EdgeHeaders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// `"base64"` means the body must be decoded before writing; any other
    /// value is treated as raw text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_encoding: Option<String>,
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("invalid status code: {0}")]
    InvalidStatus(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid base64 body: {0}")]
    InvalidBody(#[from] base64::DecodeError),
}

/// Apply a handler response onto a live HTTP response.
pub fn write(response: EdgeResponse) -> Result<Response<Full<Bytes>>, ResponseError> {
    let status = match &response.status {
        Some(status) => status
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| ResponseError::InvalidStatus(status.clone()))?,
        None => StatusCode::OK,
    };

    let payload = match response.body {
        Some(text) if response.body_encoding.as_deref() == Some("base64") => {
            Bytes::from(body::decode(&text)?)
        }
        Some(text) => Bytes::from(text),
        None => Bytes::new(),
    };

    let mut written = Response::new(Full::new(payload));
    *written.status_mut() = status;

    if let Some(edge_headers) = &response.headers {
        for entry in headers::to_node(edge_headers) {
            let name = HeaderName::from_bytes(entry.key.as_bytes())
                .map_err(|_| ResponseError::InvalidHeader(entry.key.clone()))?;
            let value = HeaderValue::from_str(&entry.value)
                .map_err(|_| ResponseError::InvalidHeader(entry.key.clone()))?;

            // insert, not append: one value per name, a repeated name
            // replaces the earlier value
            written.headers_mut().insert(name, value);
        }
    }

    Ok(written)
}
