//! Backend selection and per-backend settings.
//!
//! Deserialized from the `[backend]` table of the daemon configuration:
//!
//! ```toml
//! [backend]
//! type = "avr"
//! device = "/dev/ttyAMA0"
//! ack_timeout_ms = 150
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{BackendError, Result};

/// Which backend drives the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// AVR microcontroller on a serial line.
    Avr(SerialConfig),
    /// Nuki smart lock behind a Nuki bridge.
    NukiBridge(BridgeConfig),
    /// In-memory backend that accepts every command.
    Simulation,
}

impl BackendConfig {
    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Avr(serial) => serial.validate(),
            Self::NukiBridge(bridge) => bridge.validate(),
            Self::Simulation => Ok(()),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Avr(SerialConfig::default())
    }
}

/// Serial link to the AVR controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub device: String,
    pub baud_rate: u32,
    /// Reader cycle period.
    pub poll_interval_ms: u64,
    /// Per-read timeout of the serial port.
    pub read_timeout_ms: u64,
    /// Wait this long for the controller to echo a command. Without it a
    /// written and flushed command counts as confirmed.
    pub ack_timeout_ms: Option<u64>,
    /// Upper bound for a `set_state` call, queueing included.
    pub command_timeout_ms: u64,
}

impl SerialConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Option<Duration> {
        self.ack_timeout_ms.map(Duration::from_millis)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.device.is_empty() {
            return Err(BackendError::configuration("serial device must not be empty"));
        }
        if self.baud_rate == 0 {
            return Err(BackendError::configuration("baud_rate must be positive"));
        }
        if self.poll_interval_ms == 0 {
            return Err(BackendError::configuration("poll_interval_ms must be positive"));
        }
        let mut floor = self.poll_interval_ms;
        if let Some(ack) = self.ack_timeout_ms {
            floor += ack;
        }
        if self.command_timeout_ms <= floor {
            return Err(BackendError::configuration(format!(
                "command_timeout_ms ({}) must exceed one reader cycle ({floor}ms)",
                self.command_timeout_ms
            )));
        }
        Ok(())
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyAMA0".to_string(),
            baud_rate: 9600,
            poll_interval_ms: 400,
            read_timeout_ms: 10,
            ack_timeout_ms: None,
            command_timeout_ms: 2000,
        }
    }
}

/// HTTP API of a Nuki bridge.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL, e.g. `http://10.0.0.20:8080/`.
    pub endpoint: String,
    pub api_token: String,
    /// Lock name as configured in the Nuki app.
    pub device_name: String,
    #[serde(default = "default_bridge_poll_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_bridge_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_bridge_poll_ms() -> u64 {
    10_000
}

fn default_bridge_request_timeout_ms() -> u64 {
    5_000
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(BackendError::configuration("bridge endpoint must not be empty"));
        }
        if self.device_name.is_empty() {
            return Err(BackendError::configuration("bridge device_name must not be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(BackendError::configuration("poll_interval_ms must be positive"));
        }
        Ok(())
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"<redacted>")
            .field("device_name", &self.device_name)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}
