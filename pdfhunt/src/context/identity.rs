//! Run identity for a single orchestration run.

use crate::utils::generate_uuid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Short token identifying one run, used to name persisted artifacts.
///
/// Generated from the leading hex digits of a random UUID v4, so collisions
/// are unlikely for the number of runs a single output directory sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Number of characters in a generated run id.
    pub const LEN: usize = 8;

    /// Generates a fresh run id.
    #[must_use]
    pub fn generate() -> Self {
        let mut token = generate_uuid().simple().to_string();
        token.truncate(Self::LEN);
        Self(token)
    }

    /// Wraps an existing token.
    ///
    /// Returns `None` for an empty or whitespace-only token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_run_id_shape() {
        let id = RunId::generate();
        assert_eq!(id.as_str().len(), RunId::LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_run_ids_differ() {
        let a = RunId::generate();
        let b = RunId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_rejects_blank() {
        assert!(RunId::new("").is_none());
        assert!(RunId::new("   ").is_none());
        assert_eq!(RunId::new("abc12345").unwrap().to_string(), "abc12345");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = RunId::new("deadbeef").unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("deadbeef"));
    }
}
