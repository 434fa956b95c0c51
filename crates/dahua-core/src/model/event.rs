// ── Event domain types ──

use serde::{Serialize, Serializer};

/// Name under which every record is published on the event bus.
pub const EVENT_RECEIVED: &str = "dahua_event_received";

/// Device event index → channel number. Only one channel is handled.
const CHANNEL_MAP: &[(&str, &str)] = &[("1", "1")];

/// Resolve a channel from an event index.
pub fn channel_for_index(index: &str) -> Option<String> {
    CHANNEL_MAP
        .iter()
        .find(|(i, _)| *i == index)
        .map(|(_, channel)| (*channel).to_owned())
}

/// Where a record came from. Only doorbell records honour `Pulse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    Camera,
    Doorbell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Start,
    Stop,
    Pulse,
    Other(String),
}

impl EventAction {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("start") {
            Self::Start
        } else if raw.eq_ignore_ascii_case("stop") {
            Self::Stop
        } else if raw.eq_ignore_ascii_case("pulse") {
            Self::Pulse
        } else {
            Self::Other(raw.to_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Pulse => "Pulse",
            Self::Other(raw) => raw,
        }
    }
}

impl Serialize for EventAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Event payload: parsed JSON, or the raw text when it is not JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    Structured(serde_json::Value),
    Raw(String),
}

impl EventData {
    /// Parse a payload string, keeping it raw on failure.
    pub fn from_text(text: &str) -> Self {
        serde_json::from_str(text).map_or_else(|_| Self::Raw(text.to_owned()), Self::Structured)
    }

    /// Look up a top-level field of a structured payload.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        match self {
            Self::Structured(value) => value.get(key),
            Self::Raw(_) => None,
        }
    }
}

/// One decoded device event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    /// Device display name at dispatch time.
    pub name: String,
    #[serde(rename = "Code")]
    pub code: String,
    pub action: EventAction,
    pub index: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
    #[serde(rename = "DeviceName")]
    pub device_name: String,
    /// Routing only; not part of the published payload.
    #[serde(skip)]
    pub origin: EventOrigin,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn action_parse_is_case_insensitive() {
        assert_eq!(EventAction::parse("Start"), EventAction::Start);
        assert_eq!(EventAction::parse("stop"), EventAction::Stop);
        assert_eq!(EventAction::parse("PULSE"), EventAction::Pulse);
        assert_eq!(
            EventAction::parse("State"),
            EventAction::Other("State".into())
        );
    }

    #[test]
    fn channel_map_resolves_known_index_only() {
        assert_eq!(channel_for_index("1").as_deref(), Some("1"));
        assert_eq!(channel_for_index("0"), None);
    }

    #[test]
    fn record_serializes_in_bus_shape() {
        let record = EventRecord {
            name: "Porch".into(),
            code: "VideoMotion".into(),
            action: EventAction::Start,
            index: "0".into(),
            channel: None,
            data: Some(EventData::Raw("{broken".into())),
            device_name: "Porch".into(),
            origin: EventOrigin::Camera,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Code"], "VideoMotion");
        assert_eq!(json["action"], "Start");
        assert_eq!(json["data"], "{broken");
        assert!(json.get("channel").is_none());
        assert!(json.get("origin").is_none());
        assert_eq!(
            json.as_object().unwrap().keys().collect::<Vec<_>>(),
            ["Code", "DeviceName", "action", "data", "index", "name"]
        );
    }
}
