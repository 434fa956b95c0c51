// dahua-core: Device state coordinator between dahua-api and consumers.

pub mod api;
pub mod clock;
pub mod command;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod model;
pub mod refresh;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::{ApiOperation, DeviceApi};
pub use clock::{Clock, SystemClock};
pub use command::Command;
pub use config::{DEFAULT_EVENTS, DeviceConfig, TlsVerification};
pub use coordinator::{Coordinator, EventSources, UpdateStatus};
pub use error::CoreError;
pub use events::{DoorbellSource, FrameSource};
pub use store::StateSnapshot;

pub use model::{
    Capabilities, Capability, CapabilityFlag, DeviceClass, DeviceIdentity, DeviceProfile,
    EVENT_RECEIVED,
    EventAction, EventData, EventOrigin, EventRecord, ProfileMode,
};
