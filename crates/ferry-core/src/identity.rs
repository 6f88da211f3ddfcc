//! Chat-platform user identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric user identity as issued by the chat platform.
///
/// Telegram user ids are positive 64-bit integers. Zero is never a valid
/// user and is rejected wherever an id is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Error returned when a command argument is not a valid user id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid user id: {input:?}")]
pub struct ParseUserIdError {
    /// The rejected input, trimmed.
    pub input: String,
}

impl FromStr for UserId {
    type Err = ParseUserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseUserIdError {
                input: trimmed.to_owned(),
            })
    }
}
