//! Request descriptors and per-call options.

use crate::registry::Fingerprint;
use crate::Result;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// Everything that identifies one logical request.
///
/// Immutable once built; the pipeline attaches credentials and cancellation
/// separately.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    query: Option<Value>,
    body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: None,
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Query parameters from any serializable value. Null entries are dropped.
    pub fn with_query<Q: Serialize + ?Sized>(self, query: &Q) -> Result<Self> {
        Ok(self.with_query_value(serde_json::to_value(query)?))
    }

    pub fn with_query_value(mut self, query: Value) -> Self {
        self.query = normalize_query(query);
        self
    }

    pub fn with_body<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        Ok(self.with_body_value(serde_json::to_value(body)?))
    }

    pub fn with_body_value(mut self, body: Value) -> Self {
        self.body = match body {
            Value::Null => None,
            other => Some(other),
        };
        self
    }

    /// Routes `data` the way the convenience calls do: query for methods
    /// without a body, JSON body otherwise.
    pub fn with_data_value(self, data: Value) -> Self {
        if sends_body(&self.method) {
            self.with_body_value(data)
        } else {
            self.with_query_value(data)
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> Option<&Value> {
        self.query.as_ref()
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }
}

fn sends_body(method: &Method) -> bool {
    !matches!(
        *method,
        Method::GET | Method::DELETE | Method::HEAD | Method::OPTIONS
    )
}

fn normalize_query(query: Value) -> Option<Value> {
    match query {
        Value::Null => None,
        Value::Object(map) => {
            let map: serde_json::Map<String, Value> =
                map.into_iter().filter(|(_, v)| !v.is_null()).collect();
            if map.is_empty() {
                None
            } else {
                Some(Value::Object(map))
            }
        }
        other => Some(other),
    }
}

/// Per-call switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Participate in the global busy indicator.
    pub show_busy_indicator: bool,
    /// Emit a user notification when the call fails.
    pub notify_on_error: bool,
    /// Register for deduplication; a newer identical call cancels this one.
    pub dedupe: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Background polling: no busy indicator.
    pub fn silent() -> Self {
        Self {
            show_busy_indicator: false,
            ..Self::default()
        }
    }

    /// The caller handles failures itself: no notification.
    pub fn quiet() -> Self {
        Self {
            notify_on_error: false,
            ..Self::default()
        }
    }

    pub fn show_busy_indicator(mut self, enable: bool) -> Self {
        self.show_busy_indicator = enable;
        self
    }

    pub fn notify_on_error(mut self, enable: bool) -> Self {
        self.notify_on_error = enable;
        self
    }

    pub fn dedupe(mut self, enable: bool) -> Self {
        self.dedupe = enable;
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            show_busy_indicator: true,
            notify_on_error: true,
            dedupe: true,
        }
    }
}
