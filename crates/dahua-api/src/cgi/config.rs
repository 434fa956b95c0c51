// configManager.cgi endpoints
//
// Generic getConfig/setConfig plus the named tables the coordinator polls:
// video-input mode, disarming linkage, and the common per-profile set.

use tracing::debug;

use crate::cgi::client::DahuaClient;
use crate::error::Error;
use crate::kv::{KeyValues, merge_into};

impl DahuaClient {
    /// Read one config table.
    ///
    /// `GET /cgi-bin/configManager.cgi?action=getConfig&name={name}`
    pub async fn get_config(&self, name: &str) -> Result<KeyValues, Error> {
        let url = self.cgi_url(&format!("configManager.cgi?action=getConfig&name={name}"))?;
        debug!(name, "fetching config");
        self.get_key_values(url).await
    }

    /// Write config values.
    ///
    /// `GET /cgi-bin/configManager.cgi?action=setConfig&{key}={value}&...`
    pub async fn set_config(&self, params: &[(&str, &str)]) -> Result<(), Error> {
        let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let url = self.cgi_url(&format!(
            "configManager.cgi?action=setConfig&{}",
            query.join("&")
        ))?;
        debug!(params = params.len(), "writing config");
        self.get_ok(url).await
    }

    /// Current video-input mode; `table.VideoInMode[0].Config[0]` holds the
    /// active profile (0=day, 1=night, 2=scene).
    pub async fn get_video_in_mode(&self) -> Result<KeyValues, Error> {
        self.get_config("VideoInMode").await
    }

    /// Disarming-linkage state (`table.DisableLinkage.Enable`).
    ///
    /// Older firmwares answer 400; callers probe this once.
    pub async fn get_disarming_linkage(&self) -> Result<KeyValues, Error> {
        self.get_config("DisableLinkage").await
    }

    /// The configuration read on every polling tick: motion detection and
    /// the infrared lighting table for the given profile mode.
    ///
    /// Both tables are fetched concurrently; the first failure aborts.
    pub async fn get_common_config(&self, profile_mode: &str) -> Result<KeyValues, Error> {
        let lighting = format!("Lighting[0][{profile_mode}]");
        let (motion, lights) =
            tokio::try_join!(self.get_config("MotionDetect"), self.get_config(&lighting))?;

        let mut merged = motion;
        merge_into(&mut merged, lights);
        Ok(merged)
    }

    /// Enable or disable motion detection on channel 0.
    pub async fn set_motion_detection(&self, enabled: bool) -> Result<(), Error> {
        let value = if enabled { "true" } else { "false" };
        self.set_config(&[("MotionDetect[0].Enable", value)]).await
    }
}
