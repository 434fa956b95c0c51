//! Flag overrides on top of `dahua-config` profiles.
//!
//! This is the single boundary where CLI options cross into
//! `dahua_core::DeviceConfig`.

use std::time::Duration;

use secrecy::SecretString;

use dahua_config::{Config, Profile, config_path, profile_to_device_config};
use dahua_core::{DeviceConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `DeviceConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile the device is described by flags alone
/// (`--address`, `--username`, `DAHUA_PASSWORD`).
pub fn build_device_config(global: &GlobalOpts, cfg: &Config) -> Result<DeviceConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let Some(profile) = cfg.profiles.get(&profile_name) else {
        if global.profile.is_some() {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        return from_flags(global, cfg, &profile_name);
    };

    let mut device = resolve_profile(profile, &profile_name, global, cfg)?;
    apply_overrides(&mut device, global);
    Ok(device)
}

/// A profile with `--address` / `--username` / `--password` patched in
/// before credential resolution, so a flag-only password still resolves.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<DeviceConfig, CliError> {
    let patched = Profile {
        address: global
            .address
            .clone()
            .unwrap_or_else(|| profile.address.clone()),
        username: global.username.clone().or_else(|| profile.username.clone()),
        password: global.password.clone().or_else(|| profile.password.clone()),
        scheme: profile.scheme.clone(),
        port: profile.port,
        rtsp_port: profile.rtsp_port,
        password_env: profile.password_env.clone(),
        name: profile.name.clone(),
        events: profile.events.clone(),
        ca_cert: profile.ca_cert.clone(),
        insecure: profile.insecure,
        timeout: profile.timeout,
        poll_interval: profile.poll_interval,
    };
    Ok(profile_to_device_config(&patched, profile_name, &cfg.defaults)?)
}

fn from_flags(
    global: &GlobalOpts,
    cfg: &Config,
    profile_name: &str,
) -> Result<DeviceConfig, CliError> {
    let address = global.address.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;

    let probe = Profile {
        address: address.to_owned(),
        ..Profile::default()
    };
    let url = probe.base_url()?;

    let (Some(username), Some(password)) = (global.username.clone(), global.password.clone())
    else {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    };

    let mut device = DeviceConfig::new(url, username, SecretString::from(password));
    device.timeout = Duration::from_secs(cfg.defaults.timeout);
    device.poll_interval = Duration::from_secs(cfg.defaults.poll_interval);
    apply_overrides(&mut device, global);
    Ok(device)
}

/// `--password` beats every stored secret; the rest only when given.
fn apply_overrides(device: &mut DeviceConfig, global: &GlobalOpts) {
    if let Some(ref password) = global.password {
        device.password = SecretString::from(password.clone());
    }
    if global.insecure {
        device.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        device.timeout = Duration::from_secs(secs);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["dahua"];
        argv.extend_from_slice(args);
        argv.push("check");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_porch() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "porch".into(),
            Profile {
                address: "192.168.1.108".into(),
                username: Some("admin".into()),
                password: Some("from-file".into()),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_alone_describe_a_device() {
        let g = global(&[
            "--address",
            "10.0.0.7",
            "--username",
            "admin",
            "--password",
            "secret",
            "--timeout",
            "5",
        ]);
        let device = build_device_config(&g, &Config::default()).unwrap();
        assert_eq!(device.url.as_str(), "http://10.0.0.7/");
        assert_eq!(device.password.expose_secret(), "secret");
        assert_eq!(device.timeout, Duration::from_secs(5));
    }

    #[test]
    fn flags_override_profile_address() {
        let g = global(&["--profile", "porch", "--address", "10.0.0.9"]);
        let device = build_device_config(&g, &config_with_porch()).unwrap();
        assert_eq!(device.url.host_str(), Some("10.0.0.9"));
        assert_eq!(device.username, "admin");
    }

    #[test]
    fn unknown_profile_lists_available() {
        let g = global(&["--profile", "garage"]);
        let err = build_device_config(&g, &config_with_porch()).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "garage");
                assert_eq!(available, "porch");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
