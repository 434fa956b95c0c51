//! Config subcommand handlers.

use serde::Serialize;
use tabled::Tabled;

use dahua_config::{Config, config_path};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ProfileSummary {
    name: String,
    address: String,
    username: String,
    default: bool,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Default")]
    default: String,
}

pub fn handle(args: ConfigArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            // Never print secrets.
            let redacted = redact(cfg);
            let out = toml::to_string_pretty(&redacted)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let mut profiles: Vec<ProfileSummary> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileSummary {
                    name: name.clone(),
                    address: p.address.clone(),
                    username: p.username.clone().unwrap_or_default(),
                    default: cfg.default_profile.as_deref() == Some(name.as_str()),
                })
                .collect();
            profiles.sort_by(|a, b| a.name.cmp(&b.name));

            let out = output::render_list(
                &global.output,
                &profiles,
                |p| ProfileRow {
                    name: p.name.clone(),
                    address: p.address.clone(),
                    username: p.username.clone(),
                    default: if p.default { "*".into() } else { String::new() },
                },
                |p| p.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

fn redact(cfg: &Config) -> toml::Value {
    let mut value = toml::Value::try_from(cfg).unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()));
    if let Some(profiles) = value.get_mut("profiles").and_then(toml::Value::as_table_mut) {
        for (_, profile) in profiles.iter_mut() {
            if let Some(table) = profile.as_table_mut() {
                if table.contains_key("password") {
                    table.insert("password".into(), toml::Value::String("********".into()));
                }
            }
        }
    }
    value
}
