//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod check;
pub mod config_cmd;
pub mod control;
pub mod info;
pub mod snapshot;
pub mod watch;

use dahua_api::DahuaClient;
use dahua_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator<DahuaClient>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Check => check::handle(coordinator, global).await,
        Command::Info => info::handle(coordinator, global).await,
        Command::Snapshot(args) => snapshot::handle(coordinator, args, global).await,
        Command::Watch(args) => watch::handle(coordinator, args, global).await,
        Command::Motion(args) => control::motion(coordinator, args, global).await,
        Command::Infrared(args) => control::infrared(coordinator, args, global).await,
        // Handled before a device is resolved.
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
