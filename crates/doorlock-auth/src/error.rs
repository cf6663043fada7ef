use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while setting up authentication.
///
/// Failed logins are not errors: they are answered with a
/// [`Response`](doorlock_core::Response).
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid or inconsistent authentication settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// A credential or blacklist file could not be read
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of the local user database does not parse
    #[error("Malformed user database entry on line {line}: {reason}")]
    MalformedUserDb { line: usize, reason: String },
}

impl AuthError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Specialized result type for authentication setup
pub type Result<T> = std::result::Result<T, AuthError>;
