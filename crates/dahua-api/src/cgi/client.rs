// CGI HTTP client
//
// Wraps `reqwest::Client` with device URL construction, basic auth, status
// mapping, and key/value body decoding. Endpoint groups (system, config,
// lighting) are implemented as inherent methods in sibling files to keep
// this module focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::kv::{KeyValues, parse_key_values};
use crate::transport::TransportConfig;

/// Username and password for the device.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Which encoder stream an RTSP URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSubtype {
    Main,
    Sub,
}

impl StreamSubtype {
    /// Numeric subtype the device expects in the RTSP query.
    pub fn index(self) -> u8 {
        match self {
            Self::Main => 0,
            Self::Sub => 1,
        }
    }
}

/// Raw HTTP client for the device CGI API.
///
/// Every read returns the decoded [`KeyValues`] body. Non-success statuses
/// become [`Error::Status`] (or [`Error::Authentication`] for 401) before
/// the caller sees them. Cheap to clone: the inner `reqwest::Client` is
/// reference counted.
#[derive(Clone)]
pub struct DahuaClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    rtsp_port: u16,
}

impl DahuaClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the device root, e.g. `http://192.168.1.108:80`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        rtsp_port: u16,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials, rtsp_port))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        rtsp_port: u16,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            rtsp_port,
        }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// RTSP URL for a channel and stream subtype.
    ///
    /// Credentials are not embedded; players pass them separately.
    pub fn rtsp_url(&self, channel: u32, subtype: StreamSubtype) -> String {
        let host = self.base_url.host_str().unwrap_or("localhost");
        format!(
            "rtsp://{host}:{}/cam/realmonitor?channel={channel}&subtype={}",
            self.rtsp_port,
            subtype.index()
        )
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a CGI path: `{base}/cgi-bin/{path_and_query}`.
    ///
    /// Brackets in config names (`Lighting[0][2]`) are left as-is; the
    /// device does not understand their percent-encoded form.
    pub(crate) fn cgi_url(&self, path_and_query: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/cgi-bin/{path_and_query}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and return the raw response.
    pub(crate) async fn send_get(
        &self,
        http: &reqwest::Client,
        url: Url,
    ) -> Result<reqwest::Response, Error> {
        debug!("GET {}", url);

        let resp = http
            .get(url)
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            )
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(resp).await
    }

    /// Send a GET and return the body as text.
    pub(crate) async fn get_text(&self, url: Url) -> Result<String, Error> {
        let resp = self.send_get(&self.http, url).await?;
        resp.text().await.map_err(Error::Transport)
    }

    /// Send a GET and decode the `key=value` body.
    pub(crate) async fn get_key_values(&self, url: Url) -> Result<KeyValues, Error> {
        let body = self.get_text(url).await?;
        Ok(parse_key_values(&body))
    }

    /// Send a GET to a write endpoint and require an `OK` answer.
    pub(crate) async fn get_ok(&self, url: Url) -> Result<(), Error> {
        let body = self.get_text(url).await?;
        if body.trim().eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(Error::Deserialization {
                message: "device did not acknowledge the request".into(),
                body,
            })
        }
    }
}

/// Map non-success statuses to errors, keeping the body for diagnostics.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "device rejected the credentials".into(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Status {
            status: status.as_u16(),
            body: body.trim().to_owned(),
        });
    }

    Ok(resp)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> DahuaClient {
        DahuaClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Credentials {
                username: "admin".into(),
                password: SecretString::from("secret".to_string()),
            },
            554,
        )
    }

    #[test]
    fn cgi_url_keeps_brackets() {
        let url = client("http://10.0.0.5/")
            .cgi_url("configManager.cgi?action=getConfig&name=Lighting[0][2]")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://10.0.0.5/cgi-bin/configManager.cgi?action=getConfig&name=Lighting[0][2]"
        );
    }

    #[test]
    fn rtsp_url_uses_rtsp_port_and_subtype() {
        let c = client("http://10.0.0.5:8080");
        assert_eq!(
            c.rtsp_url(1, StreamSubtype::Sub),
            "rtsp://10.0.0.5:554/cam/realmonitor?channel=1&subtype=1"
        );
    }
}
