//! Error taxonomy for extractions
//!
//! Absences (no match, missing attribute, probe timeout) are never errors;
//! they are encoded as empty results by the component that observes them.
//! Everything here is fatal for the extraction it occurs in.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Rejected before any browser interaction
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed ({reason}): {message}")]
    Navigation {
        url: String,
        reason: &'static str,
        message: String,
    },

    #[error("query `{selector}` failed: {message}")]
    Query { selector: String, message: String },

    #[error("evaluation for `{selector}` failed: {message}")]
    Evaluation { selector: String, message: String },

    /// Anchor and label sequences of the page pager disagree in length
    #[error("page pager mismatch: {anchors} anchors vs {labels} labels")]
    PagerMismatch { anchors: usize, labels: usize },

    #[error("extraction exceeded deadline of {}ms", .0.as_millis())]
    DeadlineExceeded(Duration),
}

impl ExtractError {
    /// Stable tag used in machine-readable output
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::InvalidRequest(_) => "invalid_request",
            ExtractError::Launch(_) => "launch_failed",
            ExtractError::Navigation { .. } => "navigation_failed",
            ExtractError::Query { .. } => "query_failed",
            ExtractError::Evaluation { .. } => "evaluation_failed",
            ExtractError::PagerMismatch { .. } => "pager_mismatch",
            ExtractError::DeadlineExceeded(_) => "deadline_exceeded",
        }
    }

    /// Client errors are the caller's fault; everything else is an internal failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, ExtractError::InvalidRequest(_))
    }
}

/// Classify a CDP navigation error message into a short reason code
pub fn navigation_reason(error: &str) -> &'static str {
    if error.contains("ERR_NAME_NOT_RESOLVED") {
        "DNS_FAILED"
    } else if error.contains("ERR_CONNECTION_REFUSED") {
        "CONNECTION_REFUSED"
    } else if error.contains("ERR_CONNECTION_TIMED_OUT") {
        "TIMEOUT"
    } else if error.contains("ERR_CERT") || error.contains("SSL") {
        "SSL_ERROR"
    } else {
        "NETWORK_ERROR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_reason() {
        assert_eq!(navigation_reason("net::ERR_NAME_NOT_RESOLVED"), "DNS_FAILED");
        assert_eq!(
            navigation_reason("ERR_CONNECTION_REFUSED"),
            "CONNECTION_REFUSED"
        );
        assert_eq!(navigation_reason("net::ERR_CERT_DATE_INVALID"), "SSL_ERROR");
        assert_eq!(navigation_reason("random error"), "NETWORK_ERROR");
    }

    #[test]
    fn test_client_error_class() {
        assert!(ExtractError::InvalidRequest("empty".into()).is_client_error());
        assert!(!ExtractError::PagerMismatch {
            anchors: 2,
            labels: 3
        }
        .is_client_error());
        assert!(!ExtractError::DeadlineExceeded(Duration::from_secs(1)).is_client_error());
    }

    #[test]
    fn test_display() {
        let err = ExtractError::DeadlineExceeded(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "extraction exceeded deadline of 1500ms");
        assert_eq!(err.kind(), "deadline_exceeded");

        let err = ExtractError::PagerMismatch {
            anchors: 4,
            labels: 3,
        };
        assert_eq!(
            err.to_string(),
            "page pager mismatch: 4 anchors vs 3 labels"
        );
    }
}
