// ── Event dispatcher ──
//
// Single consumer of both event channels and the only writer of the
// timestamp table. Every record is republished on the event bus; records
// with a registered listener also update "active since" state.

use std::sync::Arc;

use arc_swap::ArcSwap;
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::parser::{doorbell_record, parse_frames};
use crate::clock::Clock;
use crate::model::{EVENT_RECEIVED, EventAction, EventOrigin, EventRecord};
use crate::store::{EventTimestamps, ListenerTable};

pub(crate) struct Dispatcher {
    pub(crate) timestamps: Arc<EventTimestamps>,
    pub(crate) listeners: Arc<ListenerTable>,
    pub(crate) bus: broadcast::Sender<Arc<EventRecord>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) display_name: Arc<ArcSwap<String>>,
}

impl Dispatcher {
    /// Consume frames and doorbell records until cancelled or both
    /// channels close.
    pub(crate) async fn run(
        self,
        mut frames: mpsc::Receiver<Bytes>,
        mut doorbell: mpsc::Receiver<Value>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                Some(chunk) = frames.recv() => {
                    for record in parse_frames(&chunk) {
                        self.dispatch(record);
                    }
                }
                Some(event) = doorbell.recv() => {
                    match doorbell_record(&event) {
                        Some(record) => self.dispatch(record),
                        None => debug!(%event, "doorbell record without a code"),
                    }
                }
                else => break,
            }
        }
        debug!("event dispatcher exiting");
    }

    /// Publish a record, then apply it to its listener (if any).
    pub(crate) fn dispatch(&self, mut record: EventRecord) {
        let name = self.display_name.load_full();
        record.name.clone_from(&name);
        record.device_name.clone_from(&name);

        debug!(
            event = EVENT_RECEIVED,
            code = %record.code,
            action = record.action.as_str(),
            origin = ?record.origin,
            "event received"
        );

        let record = Arc::new(record);
        // No subscribers is fine.
        let _ = self.bus.send(Arc::clone(&record));

        let Some(listener) = self.listeners.get(&record.code) else {
            return;
        };

        match (&record.action, record.origin) {
            (EventAction::Start, _) => {
                self.timestamps.set(&record.code, self.clock.now());
                listener();
            }
            (EventAction::Stop, _) => {
                self.timestamps.clear(&record.code);
                listener();
            }
            // Camera pulses are ignored.
            (EventAction::Pulse, EventOrigin::Doorbell) => {
                if pulse_is_active(&record) {
                    self.timestamps.set(&record.code, self.clock.now());
                } else {
                    self.timestamps.clear(&record.code);
                }
                listener();
            }
            _ => {}
        }
    }
}

/// `DoorStatus` pulses carry `Status`; button/light pulses carry `State`.
fn pulse_is_active(record: &EventRecord) -> bool {
    let field = |key: &str| record.data.as_ref().and_then(|d| d.field(key));

    if record.code == "DoorStatus" {
        field("Status").and_then(Value::as_str) == Some("Open")
    } else {
        field("State")
            .and_then(Value::as_f64)
            .is_some_and(|state| (state - 1.0).abs() < f64::EPSILON)
    }
}
