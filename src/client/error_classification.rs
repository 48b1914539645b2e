//! Error classification logic

use crate::Error;

/// HTTP statuses worth another attempt.
pub const RETRYABLE_STATUS_CODES: &[u16] = &[408, 409, 429, 500, 502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// Whether a failed request should be attempted again.
///
/// Timeouts, the transient statuses above, and anything whose message mentions a
/// rate limit or a timeout. Fatal errors never are.
pub fn is_retryable(err: &Error) -> bool {
    if err.is_fatal() {
        return false;
    }
    if matches!(err, Error::Timeout { .. }) {
        return true;
    }
    if err.status().map(is_retryable_status).unwrap_or(false) {
        return true;
    }

    let message = err.to_string().to_lowercase();
    message.contains("rate limit") || message.contains("timeout")
}

/// Heuristic: did the service reject the request because of its tool set?
///
/// Purely textual, so a message that merely talks about tools may match. Kept
/// in one place so a structured signal can replace it later.
pub fn is_tool_compatibility_error(err: &Error) -> bool {
    let message = match err {
        Error::Remote { message, .. } => message.to_lowercase(),
        Error::Upstream { source, .. } => return is_tool_compatibility_error(source),
        other => other.to_string().to_lowercase(),
    };
    if !message.contains("tool") {
        return false;
    }

    ["unsupported", "not supported", "invalid tool", "unknown tool"]
        .iter()
        .any(|needle| message.contains(needle))
}
