//! User-facing notification texts.

pub const NETWORK_UNREACHABLE: &str = "Network connection failed, please check your network";
pub const REQUEST_TIMEOUT: &str = "Request timed out, please try again";
pub const NETWORK_ABNORMAL: &str = "Network error, please try again";

pub const BAD_REQUEST: &str = "Bad request parameters";
pub const SESSION_EXPIRED: &str = "Session expired, please log in again";
pub const FORBIDDEN: &str = "Access forbidden";
pub const NOT_FOUND: &str = "The requested resource does not exist";
pub const SERVER_ERROR: &str = "Internal server error";
pub const BAD_GATEWAY: &str = "Bad gateway";
pub const SERVICE_UNAVAILABLE: &str = "Service unavailable";
pub const GATEWAY_TIMEOUT: &str = "Gateway timeout";
pub const REQUEST_FAILED: &str = "Request failed";

pub const NO_PERMISSION: &str = "No permission";

/// Fixed text for the statuses the pipeline knows about.
///
/// 400 is absent on purpose: the server's own message wins there, with
/// [`BAD_REQUEST`] as the fallback.
pub fn http_status_text(status: u16) -> Option<&'static str> {
    let text = match status {
        401 => SESSION_EXPIRED,
        403 => FORBIDDEN,
        404 => NOT_FOUND,
        500 => SERVER_ERROR,
        502 => BAD_GATEWAY,
        503 => SERVICE_UNAVAILABLE,
        504 => GATEWAY_TIMEOUT,
        _ => return None,
    };
    Some(text)
}
