//! Body transfer encoding
//!
//! CloudFront delivers request bodies to the handler base64-encoded, and
//! handlers may return bodies the same way by setting
//! `bodyEncoding: "base64"`.

use base64::{engine::general_purpose::STANDARD, Engine};

/// Encode a buffered request body for the event payload.
pub fn encode(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

/// Decode a base64-marked response body back to raw bytes.
pub fn decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded)
}
