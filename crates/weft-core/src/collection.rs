//! Canonical collection identifiers.
//!
//! The cache is keyed by [`CollectionId`]. Upstream components variously hold
//! collections as numeric ids or as opaque strings; the canonical key is a
//! validated string, and numeric ids map onto it via their base-10 rendering
//! (`42` and `"42"` are the same collection).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A unique identifier for a collection.
///
/// Collection IDs must be non-empty and must not contain path separators or
/// control characters, so they can safely appear in log lines and storage
/// paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    /// Creates a new collection ID after validating the format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if the ID is empty or contains path
    /// separators or control characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    fn validate(id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::InvalidId {
                message: "collection id cannot be empty".to_string(),
            });
        }
        if id.contains('/') || id.contains('\\') {
            return Err(Error::InvalidId {
                message: "collection id cannot contain path separators".to_string(),
            });
        }
        if id.chars().any(char::is_control) {
            return Err(Error::InvalidId {
                message: "collection id cannot contain control characters".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for CollectionId {
    /// Maps a numeric collection id onto the canonical string key.
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
