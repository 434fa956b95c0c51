// ── Core error types ──
//
// User-facing errors from dahua-core. Consumers never see raw HTTP
// statuses or body-decoding failures; the `From<dahua_api::Error>` impl
// translates transport-layer errors into coordinator-level variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Device request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Refresh errors ───────────────────────────────────────────────
    /// A required fetch failed; the previous snapshot is kept.
    #[error("Failed to sync device state: {source}")]
    UpdateFailed {
        #[source]
        source: Box<CoreError>,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation} (requires {required})")]
    Unsupported { operation: String, required: String },

    /// The coordinator has been stopped.
    #[error("Coordinator stopped")]
    Stopped,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap an error as a failed refresh tick.
    pub(crate) fn update_failed(err: impl Into<CoreError>) -> Self {
        Self::UpdateFailed {
            source: Box::new(err.into()),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dahua_api::Error> for CoreError {
    fn from(err: dahua_api::Error) -> Self {
        match err {
            dahua_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            dahua_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            dahua_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            dahua_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            dahua_api::Error::Status { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
                status: Some(status),
            },
            dahua_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            dahua_api::Error::StreamClosed(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("Event stream closed: {reason}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_code() {
        let err: CoreError = dahua_api::Error::Status {
            status: 400,
            body: "Bad Request!".into(),
        }
        .into();
        match err {
            CoreError::Api { message, status } => {
                assert_eq!(message, "Bad Request!");
                assert_eq!(status, Some(400));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_failed_wraps_source() {
        let err = CoreError::update_failed(dahua_api::Error::Authentication {
            message: "nope".into(),
        });
        assert_eq!(
            err.to_string(),
            "Failed to sync device state: Authentication failed: nope"
        );
    }
}
