//! Authentication for door requests.
//!
//! [`Authenticator::try_auth`] turns submitted [`Credentials`] into a
//! [`Response`]: `Success`, `PermissionDenied` for bad credentials,
//! `Invalid` for empty ones and `InternalError` when the selected backend is
//! missing or broken. Two backends exist, an LDAP simple bind and a local
//! salted SHA-256 user database, plus a blacklist checked before either.
//!
//! [`Credentials`]: doorlock_core::Credentials
//! [`Response`]: doorlock_core::Response

pub mod authenticator;
pub mod blacklist;
pub mod config;
pub mod error;
pub mod ldap;
pub mod local;

pub use authenticator::Authenticator;
pub use blacklist::Blacklist;
pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use ldap::{BindOutcome, LdapAuthenticator};
pub use local::{LocalUserDb, salted_digest};
