//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The identifier was not a UUID.
    #[error("invalid entry ID: {value}")]
    InvalidEntryId { value: String },

    /// An interval ended before it started.
    #[error("entry ends at {end} before it starts at {start}")]
    EndBeforeStart { start: String, end: String },
}

/// A stable identifier for a time entry.
///
/// Assigned once when the entry is created and never reassigned. On the wire
/// and on disk it is the hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for EntryId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "entry ID" });
        }
        Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|_| ValidationError::InvalidEntryId {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Credentials used to key requests against the remote log service.
///
/// Both values are opaque to this crate; they come from whatever
/// authentication flow the host application runs.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    email: String,
    api_key: String,
}

impl Identity {
    /// Creates an identity, rejecting blank values.
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ValidationError> {
        let email = email.into();
        let api_key = api_key.into();
        if email.trim().is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }
        if api_key.trim().is_empty() {
            return Err(ValidationError::Empty { field: "API key" });
        }
        Ok(Self { email, api_key })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("email", &self.email)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
