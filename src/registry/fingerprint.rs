//! Request fingerprints.

use crate::request::RequestDescriptor;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic identity of a logical request.
///
/// Derived from method, URL, query and body. Object keys are sorted before
/// hashing so `{"a":1,"b":2}` and `{"b":2,"a":1}` collide; a missing query or
/// body hashes the same as an explicit empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(descriptor: &RequestDescriptor) -> Self {
        Self::from_parts(
            descriptor.method().as_str(),
            descriptor.url(),
            descriptor.query(),
            descriptor.body(),
        )
    }

    pub fn from_parts(method: &str, url: &str, query: Option<&Value>, body: Option<&Value>) -> Self {
        let canonical = [
            method.to_ascii_uppercase(),
            url.to_string(),
            canonical_part(query),
            canonical_part(body),
        ]
        .join("&");
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for logs.
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

fn canonical_part(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Object(map)) if map.is_empty() => String::new(),
        Some(v) => {
            let mut out = String::new();
            write_canonical(v, &mut out);
            out
        }
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
