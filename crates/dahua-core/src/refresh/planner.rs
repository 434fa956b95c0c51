// ── Refresh planner ──
//
// Decides, per polling tick, which device calls to make. The first tick
// identifies the device and probes its optional APIs; every tick then
// fetches the state those probes allow. Capability flags settle once and
// are never re-probed.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use dahua_api::KeyValues;
use dahua_api::kv::merge_into;

use super::probe::{ProbeOutcome, probe};
use crate::api::{ApiOperation, DeviceApi};
use crate::model::{Capability, CapabilityFlag, DeviceClass, DeviceProfile, ProfileMode};

const MODEL_KEY: &str = "model";
const DEVICE_TYPE_KEY: &str = "deviceType";
const UPDATE_SERIAL_KEY: &str = "updateSerial";
const MACHINE_NAME_KEY: &str = "table.General.MachineName";
const SERIAL_NUMBER_KEY: &str = "serialNumber";
const VIDEO_IN_MODE_KEY: &str = "table.VideoInMode[0].Config[0]";

/// Placeholder some firmwares report instead of the real model.
const GENERIC_DEVICE_TYPE: &str = "IP Camera";

/// Config read used to detect day/night/scene profile support.
const PROFILE_PROBE_CONFIG: &str = "Lighting[0][2]";

/// Planner lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Uninitialized,
    /// Identification in progress, or a previous attempt failed part-way.
    Initializing,
    Steady,
}

/// Probe responses reusable later in the same tick.
type TickCache = HashMap<Capability, KeyValues>;

#[derive(Debug, Default)]
pub(crate) struct RefreshPlanner {
    phase: Phase,
    profile: DeviceProfile,
    listener_requested: bool,
    pending_listener: Option<DeviceClass>,
}

impl RefreshPlanner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// The event listener to start, handed out exactly once.
    pub(crate) fn take_listener_request(&mut self) -> Option<DeviceClass> {
        self.pending_listener.take()
    }

    /// Run one tick and return the key/values it gathered, in merge order.
    ///
    /// On error nothing is returned; the caller keeps its previous snapshot.
    pub(crate) async fn tick<A: DeviceApi>(&mut self, api: &A) -> Result<KeyValues, dahua_api::Error> {
        let mut data = KeyValues::new();
        let mut cache = TickCache::new();

        if self.phase != Phase::Steady {
            self.phase = Phase::Initializing;
            self.initialize(api, &mut data, &mut cache).await?;
            self.phase = Phase::Steady;
            info!(
                model = %self.profile.model,
                class = %self.profile.class(),
                coaxial_control = %self.profile.capabilities.coaxial_control,
                disarming_linkage = %self.profile.capabilities.disarming_linkage,
                profile_mode = %self.profile.capabilities.profile_mode,
                "device initialized"
            );
        }

        self.steady(api, &mut data, cache).await?;
        Ok(data)
    }

    // ── Initializing ─────────────────────────────────────────────────

    async fn initialize<A: DeviceApi>(
        &mut self,
        api: &A,
        data: &mut KeyValues,
        cache: &mut TickCache,
    ) -> Result<(), dahua_api::Error> {
        let (info, name, version) = tokio::try_join!(
            api.fetch(ApiOperation::SystemInfo),
            api.fetch(ApiOperation::MachineName),
            api.fetch(ApiOperation::SoftwareVersion),
        )?;
        merge_into(data, info);
        merge_into(data, name);
        merge_into(data, version);

        let model = resolve_model(data);
        data.insert(MODEL_KEY.to_owned(), model.clone());
        self.profile.model = model;
        self.profile.machine_name = data.get(MACHINE_NAME_KEY).cloned().unwrap_or_default();
        self.profile.serial_number = data.get(SERIAL_NUMBER_KEY).cloned().unwrap_or_default();

        // Optional APIs, probed independently.
        let caps = self.profile.capabilities;
        let (coaxial, disarming) = tokio::join!(
            probe_unless_known(api, caps.coaxial_control, ApiOperation::CoaxialControlStatus),
            probe_unless_known(api, caps.disarming_linkage, ApiOperation::DisarmingLinkage),
        );
        let coaxial = self.settle(Capability::CoaxialControl, coaxial, cache);
        let disarming = self.settle(Capability::DisarmingLinkage, disarming, cache);
        coaxial?;
        disarming?;

        let class = self.profile.class();
        if !self.listener_requested {
            self.listener_requested = true;
            self.pending_listener = Some(class);
        }

        if class == DeviceClass::Camera && !self.profile.capabilities.profile_mode.is_known() {
            let op = ApiOperation::Config {
                name: PROFILE_PROBE_CONFIG.to_owned(),
            };
            // A single line back is the device's error sentinel.
            let supported = match probe(api, op).await? {
                ProbeOutcome::Supported(values) => values.len() > 1,
                ProbeOutcome::Unsupported => {
                    warn!("device does not support profile mode, using mode 0");
                    false
                }
            };
            self.profile
                .capabilities
                .settle(Capability::ProfileMode, supported);
        }

        Ok(())
    }

    /// Record a probe outcome, caching a supported response for this tick.
    fn settle(
        &mut self,
        capability: Capability,
        outcome: Result<Option<ProbeOutcome>, dahua_api::Error>,
        cache: &mut TickCache,
    ) -> Result<(), dahua_api::Error> {
        match outcome? {
            Some(ProbeOutcome::Supported(values)) => {
                self.profile.capabilities.settle(capability, true);
                cache.insert(capability, values);
            }
            Some(ProbeOutcome::Unsupported) => {
                self.profile.capabilities.settle(capability, false);
            }
            None => {}
        }
        Ok(())
    }

    // ── Steady ───────────────────────────────────────────────────────

    async fn steady<A: DeviceApi>(
        &mut self,
        api: &A,
        data: &mut KeyValues,
        mut cache: TickCache,
    ) -> Result<(), dahua_api::Error> {
        let caps = self.profile.capabilities;

        if caps.profile_mode.is_supported() && !self.profile.class().is_doorbell() {
            self.profile.profile_mode = match api.fetch(ApiOperation::VideoInMode).await {
                Ok(mode) => {
                    let profile = mode
                        .get(VIDEO_IN_MODE_KEY)
                        .and_then(|v| ProfileMode::from_device(v))
                        .unwrap_or_default();
                    merge_into(data, mode);
                    profile
                }
                Err(e) => {
                    debug!(error = %e, "could not read profile mode, using mode 0");
                    ProfileMode::default()
                }
            };
        }

        let profile = self.profile.profile_mode.index().to_owned();
        let disarming_cached = cache.remove(&Capability::DisarmingLinkage);
        let coaxial_cached = cache.remove(&Capability::CoaxialControl);
        let security_light = self.profile.supports_security_light();

        let (common, disarming, coaxial, lighting) = tokio::try_join!(
            api.fetch(ApiOperation::CommonConfig { profile }),
            fetch_if_supported(
                api,
                caps.disarming_linkage,
                disarming_cached,
                ApiOperation::DisarmingLinkage,
            ),
            fetch_if_supported(
                api,
                caps.coaxial_control,
                coaxial_cached,
                ApiOperation::CoaxialControlStatus,
            ),
            async {
                if security_light {
                    api.fetch(ApiOperation::LightingV2).await.map(Some)
                } else {
                    Ok(None)
                }
            },
        )?;

        merge_into(data, common);
        for values in [disarming, coaxial, lighting].into_iter().flatten() {
            merge_into(data, values);
        }
        Ok(())
    }
}

/// `deviceType`, unless it is the generic placeholder.
fn resolve_model(data: &KeyValues) -> String {
    let device_type = data.get(DEVICE_TYPE_KEY).map(String::as_str);
    let model = if device_type == Some(GENERIC_DEVICE_TYPE) {
        data.get(UPDATE_SERIAL_KEY).map(String::as_str)
    } else {
        device_type
    };
    model.unwrap_or_default().to_owned()
}

async fn probe_unless_known<A: DeviceApi>(
    api: &A,
    flag: CapabilityFlag,
    op: ApiOperation,
) -> Result<Option<ProbeOutcome>, dahua_api::Error> {
    if flag.is_known() {
        return Ok(None);
    }
    probe(api, op).await.map(Some)
}

/// Use this tick's probe response if there is one, otherwise fetch when
/// the capability is supported.
async fn fetch_if_supported<A: DeviceApi>(
    api: &A,
    flag: CapabilityFlag,
    cached: Option<KeyValues>,
    op: ApiOperation,
) -> Result<Option<KeyValues>, dahua_api::Error> {
    if let Some(values) = cached {
        return Ok(Some(values));
    }
    if flag.is_supported() {
        api.fetch(op).await.map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, Reply, common, kv, profile_probe};

    fn profile_probe_lines() -> Reply {
        Reply::Ok(kv(&[
            ("table.Lighting[0][2][0].Mode", "Auto"),
            ("table.Lighting[0][2][0].Correction", "50"),
        ]))
    }

    #[tokio::test]
    async fn failing_probe_is_never_requeried() {
        let api = FakeApi::device("IPC-HDW5831R-ZE");
        api.reply(ApiOperation::CoaxialControlStatus, Reply::Status(404));
        api.reply(ApiOperation::DisarmingLinkage, Reply::Status(400));
        let mut planner = RefreshPlanner::new();

        for _ in 0..3 {
            planner.tick(&api).await.unwrap();
        }

        assert_eq!(api.calls(&ApiOperation::CoaxialControlStatus), 1);
        assert_eq!(api.calls(&ApiOperation::DisarmingLinkage), 1);
        assert_eq!(api.calls(&ApiOperation::SystemInfo), 1);
        assert_eq!(api.calls(&common("0")), 3);
        assert_eq!(
            planner.profile().capabilities.coaxial_control,
            CapabilityFlag::Unsupported
        );
    }

    #[tokio::test]
    async fn supported_probe_result_is_reused_within_the_tick() {
        let api = FakeApi::device("IPC-HDW5831R-ZE");
        api.reply(
            ApiOperation::DisarmingLinkage,
            Reply::Ok(kv(&[("table.DisableLinkage.Enable", "true")])),
        );
        let mut planner = RefreshPlanner::new();

        let first = planner.tick(&api).await.unwrap();
        assert_eq!(api.calls(&ApiOperation::DisarmingLinkage), 1);
        assert_eq!(first.get("table.DisableLinkage.Enable").unwrap(), "true");

        planner.tick(&api).await.unwrap();
        assert_eq!(api.calls(&ApiOperation::DisarmingLinkage), 2);
    }

    #[tokio::test]
    async fn doorbell_skips_profile_mode() {
        let api = FakeApi::device("VTO2202F-P");
        let mut planner = RefreshPlanner::new();

        planner.tick(&api).await.unwrap();
        planner.tick(&api).await.unwrap();

        assert_eq!(planner.profile().class(), DeviceClass::Doorbell);
        assert_eq!(api.calls(&profile_probe()), 0);
        assert_eq!(api.calls(&ApiOperation::VideoInMode), 0);
        assert_eq!(planner.take_listener_request(), Some(DeviceClass::Doorbell));
        assert_eq!(planner.take_listener_request(), None);
    }

    #[tokio::test]
    async fn generic_device_type_falls_back_to_update_serial() {
        let api = FakeApi::device("IP Camera");
        api.reply(
            ApiOperation::SystemInfo,
            Reply::Ok(kv(&[("deviceType", "IP Camera"), ("updateSerial", "IPC-X1")])),
        );
        let mut planner = RefreshPlanner::new();

        let data = planner.tick(&api).await.unwrap();

        assert_eq!(data.get("model").unwrap(), "IPC-X1");
        assert_eq!(planner.profile().model, "IPC-X1");
        assert_eq!(planner.profile().machine_name, "Cam1");
    }

    #[tokio::test]
    async fn security_light_model_fetches_lighting_v2() {
        let api = FakeApi::device("IPC-HDW3849HP-AS-PV");
        api.reply(
            ApiOperation::LightingV2,
            Reply::Ok(kv(&[("table.Lighting_V2[0][0][0].Mode", "Off")])),
        );
        let mut planner = RefreshPlanner::new();

        let data = planner.tick(&api).await.unwrap();

        assert!(planner.profile().supports_security_light());
        assert!(!planner.profile().supports_infrared_light());
        assert!(data.contains_key("table.Lighting_V2[0][0][0].Mode"));
        assert_eq!(api.calls(&ApiOperation::LightingV2), 1);
    }

    #[tokio::test]
    async fn single_line_profile_probe_pins_mode_zero() {
        let api = FakeApi::device("IPC-HDW5831R-ZE");
        api.reply(
            profile_probe(),
            Reply::Ok(kv(&[(
                "Error: Error -1 getting param in name=Lighting[0][2]",
                "",
            )])),
        );
        let mut planner = RefreshPlanner::new();

        planner.tick(&api).await.unwrap();
        planner.tick(&api).await.unwrap();

        assert_eq!(
            planner.profile().capabilities.profile_mode,
            CapabilityFlag::Unsupported
        );
        assert_eq!(api.calls(&ApiOperation::VideoInMode), 0);
        assert_eq!(api.calls(&common("0")), 2);
        assert_eq!(api.calls(&profile_probe()), 1);
    }

    #[tokio::test]
    async fn supported_profile_mode_follows_video_in_mode() {
        let api = FakeApi::device("IPC-HDW5831R-ZE");
        api.reply(profile_probe(), profile_probe_lines());
        api.reply(
            ApiOperation::VideoInMode,
            Reply::Ok(kv(&[("table.VideoInMode[0].Config[0]", "1")])),
        );
        api.reply(
            common("1"),
            Reply::Ok(kv(&[("table.Lighting[0][1].Mode", "Manual")])),
        );
        let mut planner = RefreshPlanner::new();

        let data = planner.tick(&api).await.unwrap();

        assert_eq!(planner.profile().profile_mode, ProfileMode::Night);
        assert_eq!(data.get("table.VideoInMode[0].Config[0]").unwrap(), "1");
        assert_eq!(api.calls(&common("1")), 1);
        assert_eq!(api.calls(&common("0")), 0);
    }

    #[tokio::test]
    async fn video_in_mode_failure_defaults_to_zero() {
        let api = FakeApi::device("IPC-HDW5831R-ZE");
        api.reply(profile_probe(), profile_probe_lines());
        api.reply(ApiOperation::VideoInMode, Reply::Malformed);
        let mut planner = RefreshPlanner::new();

        planner.tick(&api).await.unwrap();

        assert_eq!(planner.profile().profile_mode, ProfileMode::Day);
        assert_eq!(api.calls(&common("0")), 1);
    }

    #[tokio::test]
    async fn malformed_probe_fails_tick_and_retries_initialization() {
        let api = FakeApi::device("IPC-HDW5831R-ZE");
        api.reply(ApiOperation::CoaxialControlStatus, Reply::Malformed);
        api.reply(ApiOperation::DisarmingLinkage, Reply::Status(400));
        let mut planner = RefreshPlanner::new();

        assert!(planner.tick(&api).await.is_err());
        assert_eq!(planner.phase(), Phase::Initializing);
        assert_eq!(
            planner.profile().capabilities.coaxial_control,
            CapabilityFlag::Unknown
        );
        assert_eq!(
            planner.profile().capabilities.disarming_linkage,
            CapabilityFlag::Unsupported
        );

        api.reply(ApiOperation::CoaxialControlStatus, Reply::Status(404));
        planner.tick(&api).await.unwrap();

        assert_eq!(planner.phase(), Phase::Steady);
        assert_eq!(api.calls(&ApiOperation::SystemInfo), 2);
        assert_eq!(api.calls(&ApiOperation::CoaxialControlStatus), 2);
        // Settled on the first attempt, not probed again.
        assert_eq!(api.calls(&ApiOperation::DisarmingLinkage), 1);
    }

    #[tokio::test]
    async fn required_fetch_failure_fails_the_tick() {
        let api = FakeApi::device("IPC-HDW5831R-ZE");
        api.reply(common("0"), Reply::Status(500));
        let mut planner = RefreshPlanner::new();

        let err = planner.tick(&api).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        // Identification completed; only the steady part failed.
        assert_eq!(planner.phase(), Phase::Steady);
        assert_eq!(planner.take_listener_request(), Some(DeviceClass::Camera));
    }
}
