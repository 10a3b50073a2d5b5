//! Transport seam.
//!
//! The pipeline talks to the network only through [`Transport`]. Non-2xx
//! statuses are ordinary responses here; only failures where no response
//! arrived at all are [`TransportFailure`]s.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;

/// A fully prepared outbound call.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    /// As given by the caller; relative paths are resolved by the transport.
    pub url: String,
    pub query: Option<Value>,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// No HTTP response reached the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportFailure {
    pub message: String,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Flattens a query object into `key=value` pairs with bracket notation.
///
/// `{"filter": {"status": "open"}, "ids": [1, 2]}` becomes
/// `filter[status]=open`, `ids[]=1`, `ids[]=2`. Objects inside arrays are
/// indexed (`items[0][sku]`). Nulls are skipped. Returns `None` when the query
/// is not an object.
pub fn query_pairs(query: &Value) -> Option<Vec<(String, String)>> {
    let map = query.as_object()?;
    let mut pairs = Vec::new();
    for (key, value) in map {
        flatten_into(key.clone(), value, &mut pairs);
    }
    Some(pairs)
}

fn flatten_into(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Bool(_) | Value::Number(_) => out.push((prefix, value.to_string())),
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(format!("{}[{}]", prefix, key), nested, out);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let key = match item {
                    Value::Object(_) | Value::Array(_) => format!("{}[{}]", prefix, i),
                    _ => format!("{}[]", prefix),
                };
                flatten_into(key, item, out);
            }
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportFailure>;
}

/// Failures while setting a transport up.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Transport error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(query: Value) -> Vec<(String, String)> {
        let mut pairs = query_pairs(&query).unwrap();
        pairs.sort();
        pairs
    }

    #[test]
    fn flat_query_is_unchanged() {
        assert_eq!(
            pairs(json!({"page": 1, "keyword": "tea", "hot": true})),
            vec![
                ("hot".to_string(), "true".to_string()),
                ("keyword".to_string(), "tea".to_string()),
                ("page".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn nested_values_use_brackets() {
        let got = pairs(json!({
            "filter": {"status": "open", "owner": null},
            "ids": [1, 2],
            "items": [{"sku": "A1"}],
        }));
        assert_eq!(
            got,
            vec![
                ("filter[status]".to_string(), "open".to_string()),
                ("ids[]".to_string(), "1".to_string()),
                ("ids[]".to_string(), "2".to_string()),
                ("items[0][sku]".to_string(), "A1".to_string()),
            ]
        );
    }

    #[test]
    fn non_object_query_is_rejected() {
        assert!(query_pairs(&json!([1, 2])).is_none());
        assert!(query_pairs(&json!("page=1")).is_none());
    }
}
