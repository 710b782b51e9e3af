//! Origin-request event model
//!
//! The synthetic invocation payload delivered to a handler, shaped exactly
//! like the CloudFront origin-request event so handlers written against the
//! real platform deserialize it unchanged.

use http::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::body;
use crate::headers::{self, EdgeHeaders};

/// Top-level event wrapper: a single `Records` entry per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginRequestEvent {
    #[serde(rename = "Records")]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub cf: RecordPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPayload {
    pub request: EdgeRequest,
}

/// The request portion of an origin-request event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRequest {
    /// Best-effort peer address; absent when the transport has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    pub headers: EdgeHeaders,
    pub method: String,
    /// Everything after `?` in the request target, `""` when absent.
    pub querystring: String,
    pub uri: String,
    pub body: RequestBody,
}

/// Request body carrier; `data` is base64 text, present only for non-empty
/// bodies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl OriginRequestEvent {
    /// Build the event for one HTTP transaction.
    ///
    /// Pure: the same inputs always produce a structurally identical event.
    pub fn new(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        raw_body: &[u8],
        client_ip: Option<IpAddr>,
    ) -> Self {
        let data = if raw_body.is_empty() {
            None
        } else {
            Some(body::encode(raw_body))
        };

        let request = EdgeRequest {
            client_ip: client_ip.map(|ip| ip.to_string()),
            headers: headers::to_edge(headers),
            method: method.as_str().to_string(),
            querystring: uri.query().unwrap_or_default().to_string(),
            uri: uri.path().to_string(),
            body: RequestBody { data },
        };

        Self {
            records: vec![EventRecord {
                cf: RecordPayload { request },
            }],
        }
    }

    /// The single request record carried by this event.
    pub fn request(&self) -> &EdgeRequest {
        &self.records[0].cf.request
    }
}
