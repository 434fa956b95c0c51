//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use dahua_config::ConfigError;
use dahua_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to device at {url}")]
    #[diagnostic(
        code(dahua::connection_failed),
        help(
            "Check that the device is powered and reachable.\n\
             {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(dahua::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             Devices lock the account after repeated failures."
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(dahua::no_credentials),
        help(
            "Set username/password in the profile, pass --username,\n\
             or set DAHUA_USERNAME and DAHUA_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Device error: {message}")]
    #[diagnostic(code(dahua::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Operation '{operation}' is not supported by this device")]
    #[diagnostic(code(dahua::unsupported), help("Requires {required}."))]
    Unsupported { operation: String, required: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(dahua::timeout),
        help("Increase timeout with --timeout or check device responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dahua::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dahua::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No device configured")]
    #[diagnostic(
        code(dahua::no_config),
        help(
            "Pass --address and --username, or add a profile to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(dahua::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render config: {0}")]
    #[diagnostic(code(dahua::toml))]
    Toml(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Config(inner) => match **inner {
                ConfigError::NoCredentials { .. } => exit_code::AUTH,
                ConfigError::Validation { .. } | ConfigError::UnknownProfile { .. } => {
                    exit_code::USAGE
                }
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::UpdateFailed { source } => CliError::from(*source),

            CoreError::Unsupported {
                operation,
                required,
            } => CliError::Unsupported {
                operation,
                required,
            },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Stopped => CliError::Internal("coordinator stopped".into()),

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_tick_unwraps_to_its_cause() {
        let err = CoreError::UpdateFailed {
            source: Box::new(CoreError::AuthenticationFailed {
                message: "401".into(),
            }),
        };
        let cli = CliError::from(err);
        assert!(matches!(cli, CliError::AuthFailed { .. }));
        assert_eq!(cli.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn unsupported_command_exit_code() {
        let cli = CliError::from(CoreError::Unsupported {
            operation: "SetInfraredMode".into(),
            required: "an infrared light".into(),
        });
        assert_eq!(cli.exit_code(), exit_code::UNSUPPORTED);
    }

    #[test]
    fn missing_profile_is_a_usage_error() {
        let cli = CliError::from(ConfigError::UnknownProfile {
            profile: "garage".into(),
        });
        assert_eq!(cli.exit_code(), exit_code::USAGE);
    }
}
