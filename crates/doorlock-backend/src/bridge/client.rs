//! HTTP client for the Nuki bridge API.
//!
//! Only the three endpoints the backend needs are wrapped: `list`, `lock`
//! and `unlock`. Every request carries the API token as a query parameter.
//!
//! The client is a thin transport: no retries, no caching. Timeouts come from
//! [`BridgeConfig::request_timeout`] and surface as [`BackendError::Http`].
//! A body that does not parse is [`BackendError::InvalidData`].

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::config::BridgeConfig;
use crate::error::{BackendError, Result};

/// A device as reported by `GET /list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeDevice {
    pub nuki_id: u64,
    pub name: String,
    #[serde(default)]
    pub device_type: Option<u8>,
    /// Raw state snapshot; the exact field set depends on the firmware.
    #[serde(default)]
    pub last_known_state: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionResponse {
    success: bool,
    #[serde(default)]
    battery_critical: bool,
}

/// Lock actions understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAction {
    Lock,
    Unlock,
}

impl LockAction {
    fn path(self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NukiBridgeClient {
    http: reqwest::Client,
    endpoint: Url,
    token: String,
}

impl NukiBridgeClient {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let mut endpoint = Url::parse(&config.endpoint).map_err(|e| {
            BackendError::configuration(format!("invalid bridge endpoint '{}': {e}", config.endpoint))
        })?;
        // Url::join replaces the last segment unless the path ends in '/'.
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            endpoint,
            token: config.api_token.clone(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<reqwest::Response> {
        let url = self
            .endpoint
            .join(path)
            .map_err(|e| BackendError::configuration(format!("invalid bridge path {path}: {e}")))?;
        trace!(%url, "Bridge request");

        let response = self
            .http
            .get(url)
            .query(&[("token", self.token.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::communication(format!(
                "bridge answered {status} on /{path}"
            )));
        }
        Ok(response)
    }

    /// `GET /list`
    pub async fn list(&self) -> Result<Vec<BridgeDevice>> {
        let body = self.get("list", &[]).await?.text().await?;
        let devices: Vec<BridgeDevice> = decode("list", &body)?;
        debug!(count = devices.len(), "Bridge listed devices");
        Ok(devices)
    }

    /// Look up the id of the device named `name`.
    pub async fn resolve_device(&self, name: &str) -> Result<u64> {
        self.list()
            .await?
            .into_iter()
            .find(|device| device.name == name)
            .map(|device| device.nuki_id)
            .ok_or_else(|| BackendError::configuration(format!("bridge has no device named '{name}'")))
    }

    /// Current state snapshot of one device, `None` if the bridge no longer
    /// lists it.
    pub async fn device_state(&self, nuki_id: u64) -> Result<Option<Map<String, Value>>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|device| device.nuki_id == nuki_id)
            .and_then(|device| device.last_known_state))
    }

    /// Trigger `action` on the device. Returns the bridge's `success` flag.
    pub async fn lock_action(&self, nuki_id: u64, action: LockAction) -> Result<bool> {
        let body = self
            .get(action.path(), &[("nukiId", nuki_id.to_string())])
            .await?
            .text()
            .await?;
        let response: ActionResponse = decode(action.path(), &body)?;
        if response.battery_critical {
            warn!(nuki_id, "Nuki battery critical");
        }
        Ok(response.success)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| BackendError::invalid_data(format!("unexpected body from /{path}: {e}")))
}
