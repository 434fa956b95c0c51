// Device identity endpoints
//
// magicBox.cgi (system info, firmware) and the General config table
// (machine name).

use tracing::debug;

use crate::cgi::client::DahuaClient;
use crate::error::Error;
use crate::kv::KeyValues;

impl DahuaClient {
    /// Get device system information.
    ///
    /// `GET /cgi-bin/magicBox.cgi?action=getSystemInfo`
    ///
    /// Returns `deviceType`, `serialNumber`, `updateSerial`, `hardwareVersion`
    /// and friends. Some firmwares report the generic `IP Camera` as
    /// `deviceType` and put the real model in `updateSerial`.
    pub async fn get_system_info(&self) -> Result<KeyValues, Error> {
        let url = self.cgi_url("magicBox.cgi?action=getSystemInfo")?;
        debug!("fetching system info");
        self.get_key_values(url).await
    }

    /// Get the firmware version.
    ///
    /// `GET /cgi-bin/magicBox.cgi?action=getSoftwareVersion`, answering
    /// `version=2.800.0000000.25.R,build:2020-12-29`.
    pub async fn get_software_version(&self) -> Result<KeyValues, Error> {
        let url = self.cgi_url("magicBox.cgi?action=getSoftwareVersion")?;
        debug!("fetching software version");
        self.get_key_values(url).await
    }

    /// Get the machine name configured on the device.
    ///
    /// `GET /cgi-bin/configManager.cgi?action=getConfig&name=General`,
    /// answering `table.General.MachineName=...` among others.
    pub async fn get_machine_name(&self) -> Result<KeyValues, Error> {
        let url = self.cgi_url("configManager.cgi?action=getConfig&name=General")?;
        debug!("fetching machine name");
        self.get_key_values(url).await
    }
}
