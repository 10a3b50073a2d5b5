//! Failure taxonomy shared by the classifier, the reporter and callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed pipeline call.
///
/// | Kind | Meaning |
/// |------|---------|
/// | `Cancelled` | superseded by a duplicate or aborted; not an error |
/// | `Network` | no HTTP response reached the client |
/// | `Timeout` | the transport gave up waiting |
/// | `HttpStatus` | the server answered with a non-2xx status |
/// | `Business` | 2xx with a non-success envelope code |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Cancelled,
    Network,
    Timeout,
    HttpStatus,
    Business,
}

impl ErrorKind {
    /// Returns the stable name (e.g., `"http_status"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::HttpStatus => "http_status",
            Self::Business => "business",
        }
    }

    /// Cancelled calls settle without a result but are not failures to surface.
    #[inline]
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether the server produced a response for this failure.
    #[inline]
    pub fn has_response(&self) -> bool {
        matches!(self, Self::HttpStatus | Self::Business)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cancelled_is_not_an_error() {
        assert!(!ErrorKind::Cancelled.is_error());
        assert!(ErrorKind::Network.is_error());
        assert!(ErrorKind::Business.has_response());
        assert!(!ErrorKind::Timeout.has_response());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorKind::HttpStatus).unwrap();
        assert_eq!(json, "\"http_status\"");
    }
}
