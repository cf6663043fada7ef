//! Usernames that are never let in.

use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::error::{AuthError, Result};

/// Set of denied usernames.
///
/// File format: one username per line, surrounding whitespace trimmed,
/// blank lines and lines starting with `#` ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    users: HashSet<String>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Self {
        let users = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_owned)
            .collect();
        Self { users }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AuthError::io(path, e))?;
        let blacklist = Self::parse(&content);
        info!(path = %path.display(), entries = blacklist.len(), "Loaded user blacklist");
        Ok(blacklist)
    }

    pub fn insert(&mut self, username: impl Into<String>) {
        self.users.insert(username.into());
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Blacklist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().map(Into::into).collect(),
        }
    }
}
