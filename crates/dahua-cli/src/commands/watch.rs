//! `dahua watch`: stream events until Ctrl-C or `--count` is reached.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;

use dahua_api::DahuaClient;
use dahua_core::{Coordinator, EventAction, EventRecord};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    coordinator: &Coordinator<DahuaClient>,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut rx = coordinator.events();
    coordinator.start().await?;

    if !global.quiet {
        eprintln!(
            "Watching {} ({}), Ctrl-C to stop",
            coordinator.device_name(),
            coordinator.event_list().join(", ")
        );
    }

    let color = output::should_color(&global.color);
    let mut seen = 0usize;
    let mut active = ActiveSince::default();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = rx.recv() => match received {
                Ok(record) => {
                    let line = render(&record, &mut active, &global.output, color)?;
                    output::print_output(&line, false);
                    seen += 1;
                    if args.count.is_some_and(|n| seen >= n) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

/// Start time per event code, tracked from the records themselves.
///
/// The bus carries each record before the coordinator's timestamp table is
/// updated, so the table can lag the record being printed.
#[derive(Debug, Default)]
struct ActiveSince(HashMap<String, DateTime<Local>>);

impl ActiveSince {
    fn observe(&mut self, record: &EventRecord, now: DateTime<Local>) -> Option<DateTime<Local>> {
        match record.action {
            EventAction::Start => {
                self.0.insert(record.code.clone(), now);
            }
            EventAction::Stop => {
                self.0.remove(&record.code);
            }
            _ => {}
        }
        self.0.get(&record.code).copied()
    }
}

fn render(
    record: &Arc<EventRecord>,
    active: &mut ActiveSince,
    format: &OutputFormat,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(record.as_ref(), true),
        OutputFormat::Yaml => serde_yaml::to_string(record.as_ref())
            .map(|y| format!("---\n{y}"))
            .map_err(|e| CliError::Internal(format!("YAML serialization failed: {e}"))),
        OutputFormat::Plain => Ok(format!("{} {}", record.code, record.action.as_str())),
        OutputFormat::Table => {
            let now = Local::now();
            let since = active.observe(record, now);
            Ok(line(record, now, since, color))
        }
    }
}

fn line(
    record: &EventRecord,
    now: DateTime<Local>,
    active_since: Option<DateTime<Local>>,
    color: bool,
) -> String {
    let action = record.action.as_str();
    let action = match (&record.action, color) {
        (EventAction::Start, true) => action.green().to_string(),
        (EventAction::Stop, true) => action.red().to_string(),
        (EventAction::Pulse, true) => action.yellow().to_string(),
        _ => action.to_owned(),
    };

    let since = active_since
        .map(|t| format!(" active since {}", t.format("%H:%M:%S")))
        .unwrap_or_default();

    format!(
        "{}  {:<20} {action:<6} index={}{since}",
        now.format("%H:%M:%S"),
        record.code,
        record.index
    )
}
