// ── Device state snapshot ──
//
// Flat `dotted.key.path → value` map assembled from every fetch of a
// refresh tick. Published atomically through `ArcSwap`; readers always see
// a complete tick.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use dahua_api::KeyValues;

use crate::model::ProfileMode;

/// Immutable view of the device state after one refresh tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    values: BTreeMap<String, String>,
}

impl StateSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A copy of `self` with `updates` applied. Existing keys are
    /// overwritten, never removed.
    fn merged(&self, updates: KeyValues) -> Self {
        let mut values = self.values.clone();
        values.extend(updates);
        Self { values }
    }

    fn is_true(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    // ── Derived state ────────────────────────────────────────────────

    pub fn firmware_version(&self) -> Option<&str> {
        self.get("version")
    }

    pub fn motion_detection_enabled(&self) -> bool {
        self.is_true("table.MotionDetect[0].Enable")
    }

    pub fn disarming_linkage_enabled(&self) -> bool {
        self.is_true("table.DisableLinkage.Enable")
    }

    pub fn siren_on(&self) -> bool {
        self.get("status.status.Speaker")
            .is_some_and(|v| v.eq_ignore_ascii_case("on"))
    }

    /// Red/blue flashing light on active-deterrence models.
    pub fn security_light_on(&self) -> bool {
        self.get("status.status.WhiteLight") == Some("On")
    }

    pub fn infrared_light_on(&self, profile: ProfileMode) -> bool {
        self.get(&format!("table.Lighting[0][{}].Mode", profile.index())) == Some("Manual")
    }

    /// Infrared brightness on the 0..=255 scale.
    pub fn infrared_brightness(&self, profile: ProfileMode) -> u8 {
        brightness_to_u8(self.get(&format!(
            "table.Lighting[0][{}].MiddleLight[0].Light",
            profile.index()
        )))
    }

    /// White-light illuminator present (Lighting_V2 answered for profile 0).
    pub fn supports_illuminator(&self) -> bool {
        self.contains_key("table.Lighting_V2[0][0][0].Mode")
    }

    pub fn illuminator_on(&self, profile: ProfileMode) -> bool {
        self.get(&format!("table.Lighting_V2[0][{}][0].Mode", profile.index())) == Some("Manual")
    }

    pub fn illuminator_brightness(&self) -> u8 {
        brightness_to_u8(self.get("table.Lighting_V2[0][0][0].MiddleLight[0].Light"))
    }
}

/// Convert a device brightness (0..=100) to 0..=255, rounding half up.
/// Missing or unparsable values read as 0.
pub fn brightness_to_u8(raw: Option<&str>) -> u8 {
    let percent = raw
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0)
        .min(100);
    u8::try_from((percent * 255 + 50) / 100).unwrap_or(u8::MAX)
}

// ── Store ────────────────────────────────────────────────────────────

/// Holder of the latest published snapshot.
pub struct SnapshotStore {
    current: ArcSwap<StateSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(StateSnapshot::default()),
        }
    }

    pub fn load(&self) -> Arc<StateSnapshot> {
        self.current.load_full()
    }

    /// Merge one tick's results over the current snapshot and publish.
    ///
    /// Only the refresh path calls this, one tick at a time.
    pub(crate) fn publish(&self, updates: KeyValues) -> Arc<StateSnapshot> {
        let next = Arc::new(self.current.load().merged(updates));
        self.current.store(Arc::clone(&next));
        next
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(pairs: &[(&str, &str)]) -> KeyValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn publish_never_removes_keys() {
        let store = SnapshotStore::new();
        store.publish(kv(&[("model", "IPC-X1"), ("table.MotionDetect[0].Enable", "true")]));
        let snap = store.publish(kv(&[("table.MotionDetect[0].Enable", "false")]));

        assert_eq!(snap.get("model"), Some("IPC-X1"));
        assert!(!snap.motion_detection_enabled());
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn brightness_scales_to_255() {
        assert_eq!(brightness_to_u8(Some("100")), 255);
        assert_eq!(brightness_to_u8(Some("50")), 128);
        assert_eq!(brightness_to_u8(Some("0")), 0);
        assert_eq!(brightness_to_u8(Some("250")), 255);
        assert_eq!(brightness_to_u8(Some("")), 0);
        assert_eq!(brightness_to_u8(None), 0);
    }

    #[test]
    fn derived_lighting_state_follows_profile() {
        let snap = StateSnapshot::default().merged(kv(&[
            ("table.Lighting[0][1].Mode", "Manual"),
            ("table.Lighting[0][1].MiddleLight[0].Light", "40"),
            ("table.Lighting_V2[0][0][0].Mode", "Off"),
            ("table.Lighting_V2[0][2][0].Mode", "Manual"),
            ("status.status.WhiteLight", "On"),
            ("status.status.Speaker", "Off"),
        ]));

        assert!(snap.infrared_light_on(ProfileMode::Night));
        assert!(!snap.infrared_light_on(ProfileMode::Day));
        assert_eq!(snap.infrared_brightness(ProfileMode::Night), 102);
        assert!(snap.supports_illuminator());
        assert!(snap.illuminator_on(ProfileMode::Scene));
        assert!(!snap.illuminator_on(ProfileMode::Day));
        assert!(snap.security_light_on());
        assert!(!snap.siren_on());
    }
}
