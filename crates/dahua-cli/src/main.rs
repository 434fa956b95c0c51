mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dahua_core::Coordinator;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Completions(ref args) = cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "dahua", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = dahua_config::load_config()?;

    match cli.command {
        // Config commands don't need a device
        Command::Config(args) => commands::config_cmd::handle(args, &cfg, &cli.global),

        cmd => {
            let mut device = config::build_device_config(&cli.global, &cfg)?;
            if let Command::Watch(ref args) = cmd {
                if !args.events.is_empty() {
                    device.events.clone_from(&args.events);
                }
            }
            // One-shot commands tick on demand; only `watch` polls.
            if !matches!(cmd, Command::Watch(_)) {
                device.poll_interval = std::time::Duration::ZERO;
            }

            let coordinator = Coordinator::from_config(&device)?;
            tracing::debug!(command = ?cmd, url = %device.url, "dispatching command");

            let result = commands::dispatch(cmd, &coordinator, &cli.global).await;
            coordinator.stop().await;
            result
        }
    }
}
