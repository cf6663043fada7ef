//! Local user database with salted SHA-256 password hashes.
//!
//! Each line holds `username hash:salt`, where `hash` is the lower-case hex
//! SHA-256 digest of the salt bytes followed by the password bytes.
//!
//! ```text
//! # user   sha256(salt || password)                                          salt
//! alice    9f2792e9...cc902ab0:abc
//! ```

use std::collections::HashMap;
use std::path::Path;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::error::{AuthError, Result};

/// Hex digest of `sha256(salt || password)`.
pub fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCredential {
    digest: String,
    salt: String,
}

// Verified against when the user does not exist, so both failure paths hash.
const UNKNOWN_USER_SALT: &str = "unknown-user";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct LocalUserDb {
    users: HashMap<String, StoredCredential>,
}

impl LocalUserDb {
    /// Parse the database format.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedUserDb` for a line that is not
    /// `username hash:salt`, or whose hash is not a hex SHA-256 digest.
    pub fn parse(content: &str) -> Result<Self> {
        let mut users = HashMap::new();
        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = |reason: &str| AuthError::MalformedUserDb {
                line: index + 1,
                reason: reason.to_string(),
            };

            let mut fields = line.split_whitespace();
            let (Some(username), Some(secret), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed("expected 'username hash:salt'"));
            };
            let (digest, salt) = secret
                .split_once(':')
                .ok_or_else(|| malformed("missing ':' between hash and salt"))?;
            if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(malformed("hash is not a hex SHA-256 digest"));
            }

            users.insert(
                username.to_string(),
                StoredCredential {
                    digest: digest.to_string(),
                    salt: salt.to_string(),
                },
            );
        }
        Ok(Self { users })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AuthError::io(path, e))?;
        let db = Self::parse(&content)?;
        info!(path = %path.display(), users = db.len(), "Loaded local user database");
        Ok(db)
    }

    /// Add or replace a user, hashing `password` with `salt`.
    pub fn insert(&mut self, username: impl Into<String>, salt: &str, password: &str) {
        self.users.insert(
            username.into(),
            StoredCredential {
                digest: salted_digest(salt, password),
                salt: salt.to_string(),
            },
        );
    }

    /// Check a password. Unknown users and wrong passwords are
    /// indistinguishable to the caller.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let (stored_digest, salt) = match self.users.get(username) {
            Some(stored) => (stored.digest.as_str(), stored.salt.as_str()),
            None => {
                debug!(user = %username, "No such user in local database");
                ("", UNKNOWN_USER_SALT)
            }
        };
        let computed = salted_digest(salt, password);
        // Case-sensitive: the digest is compared exactly as written in the file.
        let matches: bool = computed.as_bytes().ct_eq(stored_digest.as_bytes()).into();
        matches && self.users.contains_key(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl std::fmt::Debug for LocalUserDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalUserDb")
            .field("users", &self.users.len())
            .finish()
    }
}
