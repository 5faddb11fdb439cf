//! Domain model types for Onramp.
//!
//! - [`PlatformId`] - Identifier for a federated third-party platform
//! - [`CredentialField`] - One persisted field of the bearer credential

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a third-party platform (e.g., "google", "spotify").
///
/// Platform IDs are normalized to lowercase so they can be embedded in
/// request paths verbatim.
///
/// # Examples
///
/// ```
/// use onramp_core::PlatformId;
///
/// let google = PlatformId::new("Google");
/// assert_eq!(google.as_str(), "google");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(String);

impl PlatformId {
    /// Create a new platform ID.
    ///
    /// The ID is trimmed and normalized to lowercase.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_lowercase())
    }

    /// Get the platform ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the ID is usable as a single path segment.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlatformId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PlatformId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A persisted field of the bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    /// The bearer token itself.
    AccessToken,

    /// Explicit expiry recorded at issuance, as unix seconds.
    ExpiresAt,
}

impl CredentialField {
    /// Get the field name as used in storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::ExpiresAt => "expires_at",
        }
    }

    /// Storage key for this field under the given namespace.
    ///
    /// Keys follow the pattern: `{namespace}/credential/{field}`
    pub fn key(&self, namespace: &str) -> String {
        format!("{}/credential/{}", namespace, self.as_str())
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_id_normalization() {
        let id = PlatformId::new("  SPOTIFY ");
        assert_eq!(id.as_str(), "spotify");
        assert!(id.is_valid());
    }

    #[test]
    fn test_platform_id_rejects_path_characters() {
        assert!(!PlatformId::new("spotify/../admin").is_valid());
        assert!(!PlatformId::new("").is_valid());
        assert!(PlatformId::new("google_drive").is_valid());
    }

    #[test]
    fn test_credential_field_key() {
        assert_eq!(
            CredentialField::AccessToken.key("onramp"),
            "onramp/credential/access_token"
        );
        assert_eq!(
            CredentialField::ExpiresAt.key("test"),
            "test/credential/expires_at"
        );
    }
}
