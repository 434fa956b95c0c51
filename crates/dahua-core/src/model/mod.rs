// ── Domain model ──
//
// Plain data types shared by the planner, the event pipeline, and
// consumers. Nothing here performs I/O.

pub mod device;
pub mod event;

pub use device::{
    Capabilities, Capability, CapabilityFlag, DeviceClass, DeviceIdentity, DeviceProfile,
    ProfileMode,
};
pub use event::{
    EVENT_RECEIVED, EventAction, EventData, EventOrigin, EventRecord, channel_for_index,
};
