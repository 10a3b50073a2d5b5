//! 错误分类模块：将传输失败、HTTP 状态码和业务码统一映射为错误记录。
//!
//! # Error Classification
//!
//! Classification is pure: a [`FailureContext`] goes in, an [`ErrorRecord`] comes
//! out, and nothing else happens. Side effects (notifications, clearing the
//! credential, the post-401 redirect) live in [`ErrorReporter`], which consumes
//! records produced here.
//!
//! | Failure | Kind | Notice |
//! |---------|------|--------|
//! | cancelled / superseded | `Cancelled` | none |
//! | no response, connectivity | `Network` | network unreachable |
//! | no response, expiry | `Timeout` | request timed out |
//! | non-2xx status | `HttpStatus` | fixed status table |
//! | 2xx, envelope code not a success code | `Business` | server message |
//! | 2xx, `data` not the expected shape | `Business` | none |

mod allow_list;
mod kind;
pub mod messages;
mod record;
mod reporter;

pub use allow_list::{AllowList, DEFAULT_ALLOW_LIST};
pub use kind::ErrorKind;
pub use record::{ErrorRecord, SESSION_EXPIRED_CODE};
pub use reporter::{ErrorReporter, ReportOutcome};

/// Substrings that mark a transport message as an expiry.
const TIMEOUT_INDICATORS: &[&str] = &["timeout", "timed out", "deadline has elapsed"];

/// Substrings that mark a transport message as a connectivity problem.
const CONNECTIVITY_INDICATORS: &[&str] = &[
    "network error",
    "error trying to connect",
    "connection refused",
    "connection reset",
    "dns error",
    "failed to lookup address",
    "network is unreachable",
    "offline",
];

/// Everything the classifier needs to know about one failed call.
#[derive(Debug, Clone, Copy)]
pub enum FailureContext<'a> {
    Cancelled {
        url: &'a str,
    },
    /// The transport gave up before any HTTP response arrived.
    NoResponse {
        url: &'a str,
        message: &'a str,
    },
    HttpStatus {
        url: &'a str,
        status: u16,
        server_message: Option<&'a str>,
    },
    Business {
        url: &'a str,
        code: i64,
        message: &'a str,
    },
    /// 2xx whose body is not an envelope at all.
    MalformedEnvelope {
        url: &'a str,
        detail: &'a str,
    },
    /// Successful envelope whose `data` does not fit the caller's type.
    UndecodableData {
        url: &'a str,
        detail: &'a str,
    },
}

pub fn classify(ctx: FailureContext<'_>) -> ErrorRecord {
    match ctx {
        FailureContext::Cancelled { url } => ErrorRecord::cancelled(url),
        FailureContext::NoResponse { url, message } => classify_no_response(url, message),
        FailureContext::HttpStatus {
            url,
            status,
            server_message,
        } => classify_http_status(url, status, server_message),
        FailureContext::Business { url, code, message } => classify_business(url, code, message),
        FailureContext::MalformedEnvelope { url, detail } => ErrorRecord::new(
            ErrorKind::Business,
            url,
            format!("malformed response envelope: {}", detail),
        ),
        FailureContext::UndecodableData { url, detail } => ErrorRecord::new(
            ErrorKind::Business,
            url,
            format!("response data has an unexpected shape: {}", detail),
        ),
    }
}

fn classify_no_response(url: &str, message: &str) -> ErrorRecord {
    let lower = message.to_lowercase();
    // Expiry wins when both appear: a connect timeout is still a timeout.
    if TIMEOUT_INDICATORS.iter().any(|i| lower.contains(i)) {
        return ErrorRecord::new(ErrorKind::Timeout, url, message)
            .with_notice(messages::REQUEST_TIMEOUT);
    }
    let notice = if CONNECTIVITY_INDICATORS.iter().any(|i| lower.contains(i)) {
        messages::NETWORK_UNREACHABLE
    } else {
        messages::NETWORK_ABNORMAL
    };
    ErrorRecord::new(ErrorKind::Network, url, message).with_notice(notice)
}

fn classify_http_status(url: &str, status: u16, server_message: Option<&str>) -> ErrorRecord {
    let server_message = server_message.map(str::trim).filter(|m| !m.is_empty());
    let notice = match (status, messages::http_status_text(status)) {
        (400, _) => server_message.unwrap_or(messages::BAD_REQUEST),
        (_, Some(text)) => text,
        (_, None) => server_message.unwrap_or(messages::REQUEST_FAILED),
    };
    let message = match server_message {
        Some(m) => format!("HTTP {}: {}", status, m),
        None => format!("HTTP {}", status),
    };
    ErrorRecord::new(ErrorKind::HttpStatus, url, message)
        .with_http_status(status)
        .with_notice(notice)
}

fn classify_business(url: &str, code: i64, message: &str) -> ErrorRecord {
    let record = ErrorRecord::new(ErrorKind::Business, url, message).with_business_code(code);
    match code {
        401 => record.with_notice(messages::SESSION_EXPIRED),
        403 => record.with_notice(messages::NO_PERMISSION),
        _ if message.trim().is_empty() => record,
        _ => record.with_notice(message),
    }
}
