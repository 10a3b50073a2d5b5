//! Wire types shared with the backend.
//!
//! Every response body is wrapped in `{code, data, message}`. The envelope
//! `code` is independent of the HTTP status: a 200 response can still carry a
//! business failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T = Value> {
    pub code: i64,
    #[serde(default)]
    pub data: T,
    #[serde(default, alias = "msg")]
    pub message: String,
}

impl<T> ResponseEnvelope<T> {
    pub fn new(code: i64, data: T, message: impl Into<String>) -> Self {
        Self {
            code,
            data,
            message: message.into(),
        }
    }

    pub fn is_success(&self, codes: &SuccessCodes) -> bool {
        codes.contains(self.code)
    }
}

/// Envelope codes that mean success. Defaults to `{0, 200}`; both are in use by
/// different backends, so the set stays configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuccessCodes(BTreeSet<i64>);

impl SuccessCodes {
    pub fn new(codes: impl IntoIterator<Item = i64>) -> Self {
        Self(codes.into_iter().collect())
    }

    pub fn contains(&self, code: i64) -> bool {
        self.0.contains(&code)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }
}

impl Default for SuccessCodes {
    fn default() -> Self {
        Self::new([0, 200])
    }
}

impl From<Vec<i64>> for SuccessCodes {
    fn from(codes: Vec<i64>) -> Self {
        Self::new(codes)
    }
}

/// Best-effort `message` (or `msg`) from an error response body.
pub fn server_message(body: &[u8]) -> Option<String> {
    let json: Value = serde_json::from_slice(body).ok()?;
    json.get("message")
        .or_else(|| json.get("msg"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Paging request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: u32,
    pub page_size: u32,
}

impl PageParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData<T> {
    pub list: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PageData<T> {
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.page_size) < self.total
    }
}
