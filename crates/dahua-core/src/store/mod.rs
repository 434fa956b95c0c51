// ── Coordinator state stores ──
//
// Snapshot (written by the refresh path), event timestamps (written by
// the dispatcher), and the listener registry.

pub mod listeners;
pub mod snapshot;
pub mod timestamps;

pub use listeners::{Listener, ListenerTable};
pub use snapshot::{SnapshotStore, StateSnapshot, brightness_to_u8};
pub use timestamps::EventTimestamps;
