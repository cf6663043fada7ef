//! LDAP simple-bind authentication.
//!
//! The username is DN-escaped and substituted into the bind DN template, then
//! a simple bind with the supplied password decides. URIs are tried in order
//! until one connects. Server certificates are always verified; `ldap://`
//! connections are upgraded with StartTLS before binding.

use std::time::Duration;

use ldap3::{LdapConnAsync, LdapConnSettings, LdapError, dn_escape};
use tracing::{debug, info, warn};

use crate::error::{AuthError, Result};

/// LDAP result code for a failed simple bind.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Placeholder replaced by the username in the bind DN template.
const USER_PLACEHOLDER: &str = "%s";

/// Outcome of a bind attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    InvalidCredentials,
    /// The directory could not give an answer: no server reachable, TLS
    /// failure, timeout or an unexpected result code.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct LdapAuthenticator {
    uris: Vec<String>,
    bind_template: String,
    timeout: Duration,
}

impl LdapAuthenticator {
    /// # Errors
    ///
    /// Returns `AuthError::Config` if no URI is given, a URI is neither
    /// `ldap://` nor `ldaps://`, or the template lacks `%s`.
    pub fn new(uris: &str, bind_template: &str, timeout: Duration) -> Result<Self> {
        let uris: Vec<String> = uris.split_whitespace().map(str::to_owned).collect();
        if uris.is_empty() {
            return Err(AuthError::config("ldap_uri lists no server"));
        }
        if let Some(uri) = uris
            .iter()
            .find(|uri| !(uri.starts_with("ldap://") || uri.starts_with("ldaps://")))
        {
            return Err(AuthError::config(format!(
                "unsupported LDAP URI '{uri}', expected ldap:// or ldaps://"
            )));
        }
        if !bind_template.contains(USER_PLACEHOLDER) {
            return Err(AuthError::config(format!(
                "ldap_binddn '{bind_template}' has no {USER_PLACEHOLDER} placeholder"
            )));
        }

        info!(servers = uris.len(), "Initialising LDAP auth backend");
        Ok(Self {
            uris,
            bind_template: bind_template.to_string(),
            timeout,
        })
    }

    pub fn bind_dn(&self, username: &str) -> String {
        self.bind_template
            .replace(USER_PLACEHOLDER, &dn_escape(username))
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> BindOutcome {
        let dn = self.bind_dn(username);
        let mut last_error = String::from("no LDAP server configured");

        for uri in &self.uris {
            match tokio::time::timeout(self.timeout, self.bind(uri, &dn, password)).await {
                Ok(Ok(outcome)) => return outcome,
                Ok(Err(e)) => {
                    warn!(%uri, error = %e, "LDAP server unavailable");
                    last_error = e.to_string();
                }
                Err(_) => {
                    warn!(%uri, timeout_ms = self.timeout.as_millis() as u64, "LDAP bind timed out");
                    last_error = format!("timeout after {}ms", self.timeout.as_millis());
                }
            }
        }
        BindOutcome::Failed(last_error)
    }

    /// Connect and bind. Connection level failures are returned as `Err` so
    /// the next URI is tried; a server answer becomes a [`BindOutcome`].
    async fn bind(
        &self,
        uri: &str,
        dn: &str,
        password: &str,
    ) -> std::result::Result<BindOutcome, LdapError> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.timeout)
            .set_starttls(uri.starts_with("ldap://"));
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, uri).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                debug!(error = %e, "LDAP connection closed with error");
            }
        });

        debug!(%uri, %dn, "LDAP simple bind");
        let result = ldap.simple_bind(dn, password).await?;
        let outcome = match result.rc {
            0 => BindOutcome::Bound,
            RC_INVALID_CREDENTIALS => BindOutcome::InvalidCredentials,
            rc => BindOutcome::Failed(format!("bind returned rc={rc}: {}", result.text)),
        };
        if let Err(e) = ldap.unbind().await {
            debug!(error = %e, "LDAP unbind failed");
        }
        Ok(outcome)
    }
}
