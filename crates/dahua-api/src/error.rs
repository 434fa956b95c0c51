use thiserror::Error;

/// Top-level error type for the `dahua-api` crate.
///
/// Covers every failure mode of the CGI surface and the attach stream.
/// `dahua-core` maps these into coordinator-level errors and uses
/// [`Error::is_client_error`] to decide whether a failed capability
/// probe means "unsupported".
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device rejected the credentials (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status (400 for unknown CGI actions, 404, 500, ...).
    #[error("Device returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body could not be interpreted, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Event stream ────────────────────────────────────────────────
    /// The attach stream ended or broke mid-read.
    #[error("Event stream closed: {0}")]
    StreamClosed(String),
}

impl Error {
    /// Returns `true` for failures raised while talking to the device:
    /// transport (including timeouts), authentication, TLS, and HTTP status
    /// errors.
    ///
    /// A capability probe that fails with a client error marks the
    /// capability unsupported. Anything else (e.g. an unreadable body) is
    /// not a statement about the device's capabilities.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::Transport(_)
                | Self::Tls(_)
                | Self::Status { .. }
                | Self::StreamClosed(_)
        )
    }

    /// Returns `true` if this error indicates bad credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// HTTP status code, if the device answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Authentication { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_are_client_errors() {
        let err = Error::Status {
            status: 400,
            body: "Error\r\nBad Request!".into(),
        };
        assert!(err.is_client_error());
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn deserialization_is_not_a_client_error() {
        let err = Error::Deserialization {
            message: "not utf-8".into(),
            body: String::new(),
        };
        assert!(!err.is_client_error());
    }

    #[test]
    fn authentication_reports_401() {
        let err = Error::Authentication {
            message: "bad password".into(),
        };
        assert!(err.is_auth_error());
        assert_eq!(err.status(), Some(401));
    }
}
