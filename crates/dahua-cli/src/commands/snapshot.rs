//! `dahua snapshot`: the raw key/value state after one refresh tick.

use serde::Serialize;
use tabled::Tabled;

use dahua_api::DahuaClient;
use dahua_core::Coordinator;

use crate::cli::{GlobalOpts, SnapshotArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Entry<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(
    coordinator: &Coordinator<DahuaClient>,
    args: SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = coordinator.refresh().await?;
    let prefix = args.filter.as_deref().unwrap_or("");

    let entries: Vec<Entry<'_>> = snapshot
        .iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| Entry { key, value })
        .collect();

    let out = output::render_list(
        &global.output,
        &entries,
        |e| EntryRow {
            key: e.key.to_owned(),
            value: e.value.to_owned(),
        },
        |e| format!("{}={}", e.key, e.value),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
