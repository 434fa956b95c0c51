//! Configuration for the `dahua` CLI.
//!
//! TOML device profiles, credential resolution (env + keyring + plaintext),
//! and translation to `dahua_core::DeviceConfig`. The CLI layers its
//! global flags on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dahua_core::config::{DEFAULT_POLL_INTERVAL, DEFAULT_RTSP_PORT, default_events};
use dahua_core::{DeviceConfig, TlsVerification};

const KEYRING_SERVICE: &str = "dahua";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, falling back to `default_profile` when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        self.profiles
            .get(&name)
            .map(|p| (name.clone(), p))
            .ok_or(ConfigError::UnknownProfile { profile: name })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Refresh interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

/// A named device profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Host name or IP (`192.168.1.108`), or a full base URL.
    pub address: String,

    /// `http` or `https`. Ignored when `address` is a URL.
    pub scheme: Option<String>,

    /// HTTP port. Ignored when `address` is a URL.
    pub port: Option<u16>,

    pub rtsp_port: Option<u16>,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Display name; defaults to the device's machine name.
    pub name: Option<String>,

    /// Event codes to subscribe to.
    pub events: Option<Vec<String>>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override refresh interval.
    pub poll_interval: Option<u64>,
}

impl Profile {
    /// Device base URL derived from address, scheme and port.
    pub fn base_url(&self) -> Result<url::Url, ConfigError> {
        let raw = if self.address.contains("://") {
            self.address.clone()
        } else {
            let scheme = self.scheme.as_deref().unwrap_or("http");
            let port = self.port.unwrap_or(80);
            format!("{scheme}://{}:{port}", self.address)
        };
        raw.parse().map_err(|_| ConfigError::Validation {
            field: "address".into(),
            reason: format!("invalid address: {}", self.address),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "dahua-rs", "dahua").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("dahua");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from a specific file, with `DAHUA_*` env overrides.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DAHUA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve username + password for a profile.
///
/// Password order: the profile's `password_env` variable, `DAHUA_PASSWORD`,
/// the system keyring (`dahua` / `{profile}/password`), then plaintext.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("DAHUA_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok((username, SecretString::from(pw)));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var("DAHUA_PASSWORD") {
        return Ok((username, SecretString::from(pw)));
    }

    // 3. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok((username, SecretString::from(pw)));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `DeviceConfig` from a profile, no CLI flag overrides.
pub fn profile_to_device_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    let url = profile.base_url()?;
    let (username, password) = resolve_credentials(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::DangerAcceptInvalid // cameras ship self-signed certs
    };

    Ok(DeviceConfig {
        url,
        username,
        password,
        name: profile.name.clone(),
        events: profile.events.clone().unwrap_or_else(default_events),
        rtsp_port: profile.rtsp_port.unwrap_or(DEFAULT_RTSP_PORT),
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        poll_interval: Duration::from_secs(profile.poll_interval.unwrap_or(defaults.poll_interval)),
    })
}
