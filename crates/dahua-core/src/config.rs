// ── Runtime device configuration ──
//
// These types describe *how* to talk to one device. They carry credential
// data and polling tuning, but never touch disk. The CLI (or any other
// host) constructs a `DeviceConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use dahua_api::transport::{TlsMode, TransportConfig};

/// Event codes subscribed to when the user picks none.
pub const DEFAULT_EVENTS: &[&str] = &[
    "VideoMotion",
    "CrossLineDetection",
    "AlarmLocal",
    "VideoLoss",
    "VideoBlind",
];

pub const DEFAULT_RTSP_PORT: u16 = 554;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default for cameras.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one camera or doorbell.
///
/// Built by the CLI, passed to `Coordinator`; core never reads config files.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device URL (e.g., `http://192.168.1.108`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// User-chosen display name. Falls back to the device's machine name.
    pub name: Option<String>,
    /// Event codes to subscribe to on the camera attach stream.
    pub events: Vec<String>,
    pub rtsp_port: u16,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How often the refresh task ticks. Zero disables the task.
    pub poll_interval: Duration,
}

impl DeviceConfig {
    /// A config with default events, ports and intervals.
    pub fn new(url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            url,
            username: username.into(),
            password,
            name: None,
            events: default_events(),
            rtsp_port: DEFAULT_RTSP_PORT,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Transport settings for the api crate.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}

pub fn default_events() -> Vec<String> {
    DEFAULT_EVENTS.iter().map(|&e| e.to_owned()).collect()
}
