// ── Event frame parser ──
//
// Camera frames are the text lines of the attach stream:
//
//   Code=VideoMotion;action=Start;index=0;data={
//      "Id" : [ 0 ],
//      "RegionName" : [ "Region1" ]
//   }\r\n
//
// Records end at `\r\n`; the JSON payload contains bare `\n`. Doorbell
// records arrive pre-parsed as JSON objects with capitalized keys.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{EventAction, EventData, EventOrigin, EventRecord, channel_for_index};

const RECORD_PREFIX: &str = "Code=";
const DATA_PREFIX: &str = "data=";

/// Why a single line was skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("segment '{0}' has no '='")]
    MissingEquals(String),
}

/// Decode a chunk of whole lines into event records, in order.
///
/// Lines that do not start with `Code=` are ignored. A malformed line is
/// logged and skipped; the rest of the chunk is still parsed.
pub fn parse_frames(bytes: &[u8]) -> Vec<EventRecord> {
    let text = String::from_utf8_lossy(bytes);

    text.split("\r\n")
        .filter(|line| line.starts_with(RECORD_PREFIX))
        .filter_map(|line| match parse_line(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, line, "skipping malformed event line");
                None
            }
        })
        .collect()
}

/// Parse one `Code=...;action=...;index=...[;data=...]` line.
///
/// `data` is always the last field and may itself contain `;`, so it takes
/// the remainder of the line.
fn parse_line(line: &str) -> Result<EventRecord, FrameError> {
    let mut code = String::new();
    let mut action = String::new();
    let mut index = String::new();
    let mut data = None;

    let mut rest = line;
    while !rest.is_empty() {
        if let Some(payload) = rest.strip_prefix(DATA_PREFIX) {
            data = Some(EventData::from_text(payload));
            break;
        }

        let (segment, tail) = rest.split_once(';').unwrap_or((rest, ""));
        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| FrameError::MissingEquals(segment.to_owned()))?;

        match key {
            "Code" => value.clone_into(&mut code),
            "action" => value.clone_into(&mut action),
            "index" => value.clone_into(&mut index),
            other => debug!(key = other, "ignoring unknown event field"),
        }
        rest = tail;
    }

    Ok(EventRecord {
        name: String::new(),
        channel: channel_for_index(&index),
        action: EventAction::parse(&action),
        code,
        index,
        data,
        device_name: String::new(),
        origin: EventOrigin::Camera,
    })
}

/// Convert a doorbell JSON record (`Code`, `Action`, `Data`, `Index`).
///
/// Returns `None` when there is no string `Code`.
pub fn doorbell_record(event: &Value) -> Option<EventRecord> {
    let code = event.get("Code")?.as_str()?.to_owned();
    let action = event.get("Action").and_then(Value::as_str).unwrap_or_default();

    let index = match event.get("Index") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let data = match event.get("Data") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(EventData::from_text(s)),
        Some(other) => Some(EventData::Structured(other.clone())),
    };

    Some(EventRecord {
        name: String::new(),
        channel: channel_for_index(&index),
        action: EventAction::parse(action),
        code,
        index,
        data,
        device_name: String::new(),
        origin: EventOrigin::Doorbell,
    })
}
