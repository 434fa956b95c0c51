// ── Command API ──
//
// Device writes. Each command maps to one `ApiOperation`; the coordinator
// runs it and then refreshes so the snapshot reflects the change.

use dahua_api::InfraredMode;

use crate::api::ApiOperation;
use crate::model::ProfileMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetMotionDetection { enabled: bool },
    /// `brightness` is on the device's 0..=100 scale.
    SetInfraredMode { mode: InfraredMode, brightness: u8 },
}

impl Command {
    /// The write for this command. Lighting writes target the active
    /// profile mode's slot.
    pub(crate) fn operation(&self, profile_mode: ProfileMode) -> ApiOperation {
        match *self {
            Self::SetMotionDetection { enabled } => ApiOperation::SetMotionDetection(enabled),
            Self::SetInfraredMode { mode, brightness } => ApiOperation::SetInfraredMode {
                mode,
                brightness: brightness.min(100),
                profile: profile_mode.index().to_owned(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SetMotionDetection { .. } => "SetMotionDetection",
            Self::SetInfraredMode { .. } => "SetInfraredMode",
        }
    }
}
