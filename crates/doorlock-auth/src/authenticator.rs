//! Credential verification across the configured backends.

use doorlock_core::{AuthMethod, Credentials, Response};
use tracing::{info, warn};

use crate::blacklist::Blacklist;
use crate::config::AuthConfig;
use crate::error::Result;
use crate::ldap::{BindOutcome, LdapAuthenticator};
use crate::local::LocalUserDb;

/// Checks credentials and answers with a [`Response`].
///
/// Decision order:
///
/// 1. simulate flag set: `Success`, whatever was submitted
/// 2. blacklisted username: `PermissionDenied`
/// 3. empty username or secret: `Invalid`
/// 4. `method` not configured: `InternalError`
/// 5. the selected backend decides
///
/// The caller selects the backend through [`Credentials::method`]; a failure
/// in one backend is never retried against another.
#[derive(Debug, Default)]
pub struct Authenticator {
    simulate: bool,
    blacklist: Blacklist,
    ldap: Option<LdapAuthenticator>,
    local: Option<LocalUserDb>,
}

impl Authenticator {
    /// Authenticator with no backend enabled. Every login is answered with
    /// `InternalError` until one is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[auth]` configuration section, loading files.
    ///
    /// With `simulate` set, only the blacklist is loaded.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let mut authenticator = Self::new();
        if let Some(path) = &config.blacklist {
            authenticator.blacklist = Blacklist::load(path)?;
        }

        if config.simulate {
            warn!("Authentication is simulated, every credential will be accepted");
            authenticator.simulate = true;
            return Ok(authenticator);
        }

        if let (Some(uri), Some(binddn)) = (&config.ldap_uri, &config.ldap_binddn) {
            authenticator.ldap = Some(LdapAuthenticator::new(uri, binddn, config.ldap_timeout())?);
        }
        if let Some(path) = &config.local_user_db {
            info!("Initialising local auth backend");
            authenticator.local = Some(LocalUserDb::load(path)?);
        }

        if authenticator.backends().is_empty() {
            warn!("No authentication backend configured, all logins will fail");
        }
        Ok(authenticator)
    }

    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    pub fn with_blacklist(mut self, blacklist: Blacklist) -> Self {
        self.blacklist = blacklist;
        self
    }

    pub fn with_ldap(mut self, ldap: LdapAuthenticator) -> Self {
        self.ldap = Some(ldap);
        self
    }

    pub fn with_local_db(mut self, db: LocalUserDb) -> Self {
        self.local = Some(db);
        self
    }

    /// Enabled backends.
    pub fn backends(&self) -> Vec<AuthMethod> {
        let mut backends = Vec::with_capacity(2);
        if self.ldap.is_some() {
            backends.push(AuthMethod::LdapUserPw);
        }
        if self.local.is_some() {
            backends.push(AuthMethod::LocalUserDb);
        }
        backends
    }

    pub fn is_simulated(&self) -> bool {
        self.simulate
    }

    pub async fn try_auth(&self, credentials: &Credentials) -> Response {
        let user = credentials.username();
        let method = credentials.method();

        if self.simulate {
            warn!(user = %user, %method, "SIMULATION MODE, accepting credentials unchecked");
            return Response::Success;
        }

        if self.blacklist.contains(user) {
            info!(user = %user, "Rejected blacklisted user");
            return Response::PermissionDenied;
        }

        if user.is_empty() || credentials.secret().is_empty() {
            info!(%method, "Rejected empty username or password");
            return Response::Invalid;
        }

        let response = match method {
            AuthMethod::LdapUserPw => match &self.ldap {
                Some(ldap) => self.auth_ldap(ldap, user, credentials.secret()).await,
                None => {
                    warn!(user = %user, "LDAP login requested but LDAP is not configured");
                    Response::InternalError
                }
            },
            AuthMethod::LocalUserDb => match &self.local {
                Some(db) => {
                    info!(user = %user, "Trying local auth");
                    if db.verify(user, credentials.secret()) {
                        Response::Success
                    } else {
                        Response::PermissionDenied
                    }
                }
                None => {
                    warn!(user = %user, "Local login requested but no user database is loaded");
                    Response::InternalError
                }
            },
        };

        match response {
            Response::Success => info!(user = %user, %method, "Authenticated"),
            Response::PermissionDenied => info!(user = %user, %method, "Invalid credentials"),
            _ => {}
        }
        response
    }

    async fn auth_ldap(&self, ldap: &LdapAuthenticator, user: &str, password: &str) -> Response {
        info!(user = %user, "Trying LDAP auth");
        match ldap.authenticate(user, password).await {
            BindOutcome::Bound => Response::Success,
            BindOutcome::InvalidCredentials => Response::PermissionDenied,
            BindOutcome::Failed(reason) => {
                warn!(user = %user, %reason, "LDAP error");
                Response::InternalError
            }
        }
    }
}
