//! Traffic logging for backend calls
//!
//! Request and response bodies are truncated so document content and answers
//! do not end up verbatim in the log.

use tracing::{debug, warn};

/// Maximum characters to log for a body
const MAX_CONTENT_LOG_CHARS: usize = 200;

/// Truncate a string for logging, adding a length marker if truncated
pub(crate) fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}... ({} chars total)", &s[..cut], s.chars().count()),
    }
}

pub(crate) fn log_request(endpoint: &str, summary: &str) {
    debug!(
        target: "docchat::traffic",
        endpoint,
        request = %truncate_for_log(summary, MAX_CONTENT_LOG_CHARS),
        "REQUEST"
    );
}

pub(crate) fn log_response(endpoint: &str, status: u16, body: &str) {
    debug!(
        target: "docchat::traffic",
        endpoint,
        status,
        response = %truncate_for_log(body, MAX_CONTENT_LOG_CHARS),
        "RESPONSE"
    );
}

pub(crate) fn log_error(endpoint: &str, error: &str) {
    warn!(target: "docchat::traffic", endpoint, error, "ERROR");
}
