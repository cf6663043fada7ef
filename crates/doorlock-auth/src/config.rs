use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// `[auth]` section of the daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accept every credential. Development only.
    pub simulate: bool,
    pub blacklist: Option<PathBuf>,
    pub local_user_db: Option<PathBuf>,
    /// Space separated list of `ldap://` or `ldaps://` URIs, tried in order.
    pub ldap_uri: Option<String>,
    /// Bind DN template, `%s` is replaced by the escaped username.
    pub ldap_binddn: Option<String>,
    pub ldap_timeout_ms: u64,
}

impl AuthConfig {
    pub fn ldap_timeout(&self) -> Duration {
        Duration::from_millis(self.ldap_timeout_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            simulate: false,
            blacklist: None,
            local_user_db: None,
            ldap_uri: None,
            ldap_binddn: None,
            ldap_timeout_ms: 5_000,
        }
    }
}
