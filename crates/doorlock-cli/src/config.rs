//! Daemon configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use doorlock_auth::AuthConfig;
use doorlock_backend::BackendConfig;
use doorlock_core::Error;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/doorlockd.toml";

/// Top level of `doorlockd.toml`. `[backend]` is required, the other
/// sections fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub sounds: bool,
    pub sounds_dir: PathBuf,
    pub run_hooks: bool,
    pub scripts_dir: PathBuf,
    /// Filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_json: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            sounds: true,
            sounds_dir: PathBuf::from("/usr/share/doorlockd/sounds"),
            run_hooks: true,
            scripts_dir: PathBuf::from("/etc/doorlockd"),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.backend.validate().context("invalid [backend] section")?;

        let auth = &self.auth;
        if auth.ldap_uri.is_some() != auth.ldap_binddn.is_some() {
            return Err(invalid("[auth] ldap_uri and ldap_binddn must be set together"));
        }
        if auth.ldap_uri.is_some() && auth.ldap_timeout_ms == 0 {
            return Err(invalid("[auth] ldap_timeout_ms must be positive"));
        }
        if self.general.log_level.trim().is_empty() {
            return Err(invalid("[general] log_level is empty"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> anyhow::Error {
    Error::Config(reason.to_string()).into()
}
