//! Header translation between HTTP and the CloudFront event format
//!
//! CloudFront events carry headers as a map from the lower-cased name to a
//! list of `{key, value}` pairs. Both directions are total: no header is
//! dropped or duplicated in translation.

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CloudFront header map: lower-cased name to a single-element entry list.
pub type EdgeHeaders = BTreeMap<String, Vec<HeaderEntry>>;

/// One `{key, value}` pair inside an [`EdgeHeaders`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Convert request headers to the CloudFront format.
///
/// Every `name -> value` entry becomes `name -> [{key: name, value}]`.
/// Repeated header names are joined with `", "` into the single value,
/// matching how Node flattens request headers.
pub fn to_edge(headers: &HeaderMap) -> EdgeHeaders {
    let mut edge = EdgeHeaders::new();

    for name in headers.keys() {
        let value = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");

        let name = name.as_str().to_string();
        edge.insert(name.clone(), vec![HeaderEntry::new(name, value)]);
    }

    edge
}

/// Flatten a CloudFront header map back to one pair per name.
///
/// The pair's key is the map name; the value comes from the first list
/// element. Entries with an empty list are skipped so the translation
/// stays total.
pub fn to_node(headers: &EdgeHeaders) -> Vec<HeaderEntry> {
    headers
        .iter()
        .filter_map(|(name, entries)| {
            entries
                .first()
                .map(|entry| HeaderEntry::new(name.clone(), entry.value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderName, HeaderValue};

    fn request_headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn test_to_edge_wraps_each_header() {
        let headers = request_headers(&[("host", "localhost:3000"), ("accept", "*/*")]);

        let edge = to_edge(&headers);

        assert_eq!(edge.len(), 2);
        assert_eq!(
            edge["host"],
            vec![HeaderEntry::new("host", "localhost:3000")]
        );
        assert_eq!(edge["accept"], vec![HeaderEntry::new("accept", "*/*")]);
    }

    #[test]
    fn test_to_edge_joins_repeated_names() {
        let headers = request_headers(&[("x-tag", "a"), ("x-tag", "b")]);

        let edge = to_edge(&headers);

        assert_eq!(edge["x-tag"], vec![HeaderEntry::new("x-tag", "a, b")]);
    }

    #[test]
    fn test_to_edge_empty_map() {
        assert!(to_edge(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_to_node_flattens_entries() {
        let mut edge = EdgeHeaders::new();
        edge.insert(
            "content-type".to_string(),
            vec![HeaderEntry::new("Content-Type", "text/html")],
        );

        let flat = to_node(&edge);

        assert_eq!(flat, vec![HeaderEntry::new("content-type", "text/html")]);
    }

    #[test]
    fn test_to_node_skips_empty_entry_list() {
        let mut edge = EdgeHeaders::new();
        edge.insert("x-empty".to_string(), vec![]);
        edge.insert("host".to_string(), vec![HeaderEntry::new("Host", "a")]);

        let flat = to_node(&edge);

        assert_eq!(flat, vec![HeaderEntry::new("host", "a")]);
    }

    #[test]
    fn test_round_trip_preserves_pairs() {
        let headers = request_headers(&[
            ("host", "localhost:3000"),
            ("user-agent", "curl/8.0"),
            ("cache-control", "max-age=0"),
        ]);

        let flat = to_node(&to_edge(&headers));

        assert_eq!(flat.len(), headers.len());
        for entry in flat {
            assert_eq!(headers.get(&entry.key).unwrap(), entry.value.as_str());
        }
    }

    #[test]
    fn test_to_edge_is_pure() {
        let headers = request_headers(&[("host", "a")]);

        // Calling twice over the same input yields the same value.
        assert_eq!(to_edge(&headers), to_edge(&headers));
    }
}
