use super::kind::ErrorKind;
use serde::Serialize;

/// Status and envelope code that both mean "the session is no longer valid".
pub const SESSION_EXPIRED_CODE: u16 = 401;

/// A classified failure, constructed once per failed call.
///
/// `message` is diagnostic text for logs and callers; `notice` is the user-facing
/// text the reporter hands to the notification sink (`None` means nothing to show).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind} failure for {url}: {message}")]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub http_status: Option<u16>,
    pub business_code: Option<i64>,
    pub message: String,
    pub url: String,
    pub notice: Option<String>,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            http_status: None,
            business_code: None,
            message: message.into(),
            url: url.into(),
            notice: None,
        }
    }

    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, url, "request cancelled")
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_business_code(mut self, code: i64) -> Self {
        self.business_code = Some(code);
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    /// HTTP 401, or an envelope carrying code 401.
    pub fn is_session_expired(&self) -> bool {
        match self.kind {
            ErrorKind::HttpStatus => self.http_status == Some(SESSION_EXPIRED_CODE),
            ErrorKind::Business => self.business_code == Some(i64::from(SESSION_EXPIRED_CODE)),
            _ => false,
        }
    }
}
