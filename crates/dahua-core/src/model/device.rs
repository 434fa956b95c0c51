// ── Device identity and capability types ──

use serde::Serialize;
use strum::Display;

/// Camera or doorbell, derived from the model string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum DeviceClass {
    Camera,
    Doorbell,
}

impl DeviceClass {
    /// Doorbells are the VTO family (also sold under the DHI prefix).
    pub fn from_model(model: &str) -> Self {
        let upper = model.to_ascii_uppercase();
        if upper.starts_with("VTO") || upper.starts_with("DHI") {
            Self::Doorbell
        } else {
            Self::Camera
        }
    }

    pub fn is_doorbell(self) -> bool {
        self == Self::Doorbell
    }
}

/// Optional API surfaces discovered by probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    CoaxialControl,
    DisarmingLinkage,
    ProfileMode,
}

/// Tri-state probe result. Leaves `Unknown` at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
pub enum CapabilityFlag {
    #[default]
    Unknown,
    Supported,
    Unsupported,
}

impl CapabilityFlag {
    pub fn is_supported(self) -> bool {
        self == Self::Supported
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

/// The flag set for every probed capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub coaxial_control: CapabilityFlag,
    pub disarming_linkage: CapabilityFlag,
    pub profile_mode: CapabilityFlag,
}

impl Capabilities {
    /// Record a probe outcome. A flag that is already known is left alone.
    pub(crate) fn settle(&mut self, capability: Capability, supported: bool) {
        let slot = match capability {
            Capability::CoaxialControl => &mut self.coaxial_control,
            Capability::DisarmingLinkage => &mut self.disarming_linkage,
            Capability::ProfileMode => &mut self.profile_mode,
        };
        if slot.is_known() {
            return;
        }
        *slot = if supported {
            CapabilityFlag::Supported
        } else {
            CapabilityFlag::Unsupported
        };
    }
}

/// Active video-input profile: 0=day, 1=night, 2=scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
pub enum ProfileMode {
    #[default]
    #[strum(serialize = "0")]
    Day,
    #[strum(serialize = "1")]
    Night,
    #[strum(serialize = "2")]
    Scene,
}

impl ProfileMode {
    /// Parse a device value; anything other than `0`, `1` or `2` is `None`.
    pub fn from_device(value: &str) -> Option<Self> {
        match value.trim() {
            "0" => Some(Self::Day),
            "1" => Some(Self::Night),
            "2" => Some(Self::Scene),
            _ => None,
        }
    }

    /// Index used in config names such as `Lighting[0][{index}]`.
    pub fn index(self) -> &'static str {
        match self {
            Self::Day => "0",
            Self::Night => "1",
            Self::Scene => "2",
        }
    }
}

/// Result of a credential check: who answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub machine_name: String,
    pub serial_number: String,
}

/// What the coordinator has learned about the device so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    pub model: String,
    pub machine_name: String,
    pub serial_number: String,
    pub capabilities: Capabilities,
    pub profile_mode: ProfileMode,
}

impl DeviceProfile {
    pub fn class(&self) -> DeviceClass {
        DeviceClass::from_model(&self.model)
    }

    // ── Model-derived features (Dahua naming convention) ─────────────

    /// Siren and red/blue security light ship together on `-AS-PV` models.
    pub fn supports_siren(&self) -> bool {
        self.model.contains("-AS-PV")
    }

    pub fn supports_security_light(&self) -> bool {
        self.model.contains("-AS-PV")
    }

    /// Full-colour and active-deterrence models have no infrared light.
    pub fn supports_infrared_light(&self) -> bool {
        !["-AS-PV", "-AS-NI", "-AS-LED"]
            .iter()
            .any(|suffix| self.model.contains(suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(model: &str) -> DeviceProfile {
        DeviceProfile {
            model: model.into(),
            ..DeviceProfile::default()
        }
    }

    #[test]
    fn doorbell_prefixes() {
        assert_eq!(DeviceClass::from_model("VTO2202F-P"), DeviceClass::Doorbell);
        assert_eq!(DeviceClass::from_model("dhi-vto2111d"), DeviceClass::Doorbell);
        assert_eq!(DeviceClass::from_model("IPC-HDW5831R-ZE"), DeviceClass::Camera);
        assert_eq!(DeviceClass::from_model(""), DeviceClass::Camera);
    }

    #[test]
    fn active_deterrence_model_features() {
        let p = profile("IPC-HDW3849HP-AS-PV");
        assert!(p.supports_siren());
        assert!(p.supports_security_light());
        assert!(!p.supports_infrared_light());
    }

    #[test]
    fn plain_camera_has_infrared_only() {
        let p = profile("IPC-HDW5831R-ZE");
        assert!(!p.supports_siren());
        assert!(p.supports_infrared_light());
        assert!(!profile("IPC-HFW2439S-AS-LED").supports_infrared_light());
        assert!(!profile("IPC-HDW2231T-AS-NI").supports_infrared_light());
    }

    #[test]
    fn settle_is_one_shot() {
        let mut caps = Capabilities::default();
        caps.settle(Capability::CoaxialControl, false);
        caps.settle(Capability::CoaxialControl, true);
        assert_eq!(caps.coaxial_control, CapabilityFlag::Unsupported);
        assert_eq!(caps.profile_mode, CapabilityFlag::Unknown);
    }

    #[test]
    fn profile_mode_parsing() {
        assert_eq!(ProfileMode::from_device("1"), Some(ProfileMode::Night));
        assert_eq!(ProfileMode::from_device(""), None);
        assert_eq!(ProfileMode::from_device("7"), None);
        assert_eq!(ProfileMode::Scene.to_string(), "2");
    }
}
