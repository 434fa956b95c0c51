// ── Device API seam ──
//
// The coordinator talks to the device through `DeviceApi::fetch`, one
// call per `ApiOperation`. `DahuaClient` is the production implementation;
// tests plug in scripted fakes.

use std::future::Future;

use dahua_api::{DahuaClient, InfraredMode, KeyValues};

/// One request the coordinator can issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    SystemInfo,
    MachineName,
    SoftwareVersion,
    CoaxialControlStatus,
    DisarmingLinkage,
    /// Generic `getConfig` for a named table.
    Config { name: String },
    VideoInMode,
    /// Motion detection plus the lighting table for a profile mode.
    CommonConfig { profile: String },
    LightingV2,

    // ── Writes ───────────────────────────────────────────────────────
    SetMotionDetection(bool),
    /// Infrared write into the lighting slot of `profile`.
    SetInfraredMode {
        mode: InfraredMode,
        brightness: u8,
        profile: String,
    },
}

/// Key/value fetch surface the coordinator depends on.
///
/// Writes answer with an empty map.
pub trait DeviceApi: Send + Sync + 'static {
    fn fetch(
        &self,
        op: ApiOperation,
    ) -> impl Future<Output = Result<KeyValues, dahua_api::Error>> + Send;
}

impl DeviceApi for DahuaClient {
    async fn fetch(&self, op: ApiOperation) -> Result<KeyValues, dahua_api::Error> {
        match op {
            ApiOperation::SystemInfo => self.get_system_info().await,
            ApiOperation::MachineName => self.get_machine_name().await,
            ApiOperation::SoftwareVersion => self.get_software_version().await,
            ApiOperation::CoaxialControlStatus => self.get_coaxial_control_io_status().await,
            ApiOperation::DisarmingLinkage => self.get_disarming_linkage().await,
            ApiOperation::Config { name } => self.get_config(&name).await,
            ApiOperation::VideoInMode => self.get_video_in_mode().await,
            ApiOperation::CommonConfig { profile } => self.get_common_config(&profile).await,
            ApiOperation::LightingV2 => self.get_lighting_v2().await,
            ApiOperation::SetMotionDetection(enabled) => {
                self.set_motion_detection(enabled).await?;
                Ok(KeyValues::new())
            }
            ApiOperation::SetInfraredMode {
                mode,
                brightness,
                profile,
            } => {
                self.set_infrared_mode(mode, brightness, &profile).await?;
                Ok(KeyValues::new())
            }
        }
    }
}
