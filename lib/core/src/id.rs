//! Strongly-typed identifier for stored principals.
//!
//! Identifiers are ULIDs rendered with a `usr_` prefix. The username is the
//! externally visible key of a principal; the id is what storage uses as
//! its primary key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

const USER_ID_PREFIX: &str = "usr";

/// Error returned when parsing a `UserId` from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The offending input.
    pub input: String,
    /// Why the input was rejected.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid user id '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Unique identifier for a principal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Ulid);

impl UserId {
    /// Creates a new id from a freshly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Wraps an existing ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{USER_ID_PREFIX}_{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIdError;

    /// Accepts both the prefixed form (`usr_01H...`) and a bare ULID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(USER_ID_PREFIX)
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(s);

        Ulid::from_str(raw).map(Self).map_err(|e| ParseIdError {
            input: s.to_string(),
            reason: e.to_string(),
        })
    }
}
