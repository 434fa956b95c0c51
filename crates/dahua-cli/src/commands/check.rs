//! `dahua check`: one identity fetch, nothing else.

use dahua_api::DahuaClient;
use dahua_core::{Coordinator, DeviceIdentity};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    coordinator: &Coordinator<DahuaClient>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let identity = coordinator.check_credentials().await?;

    let out = output::render_single(
        &global.output,
        &identity,
        |id: &DeviceIdentity| {
            format!(
                "Credentials accepted by '{}' (serial {})",
                id.machine_name, id.serial_number
            )
        },
        |id| id.serial_number.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
