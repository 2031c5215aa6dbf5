//! Vended credential types and the credential source seam.
//!
//! The access manager issues short-lived, collection-scoped storage
//! credentials. [`CredentialSource`] is the boundary the cache refreshes
//! through; production code uses the gRPC-backed
//! [`AccessManagerClient`](crate::client::AccessManagerClient), tests inject
//! fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::collection::CollectionId;
use crate::error::Result;

/// Credential scope requested for a storage handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-only credential scope.
    ReadOnly,
    /// Read-write credential scope.
    ReadWrite,
}

impl AccessMode {
    /// Returns true when the mode requests write access.
    ///
    /// This is the boolean that crosses the wire as `write_access`.
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// A single credential request, built verbatim from the caller's inputs.
#[derive(Debug, Clone)]
pub struct CredentialRequest {
    /// Collection the credentials are scoped to.
    pub collection_id: CollectionId,
    /// Deployment instance issuing the request.
    pub instance_name: String,
    /// Bucket the credentials must grant access to.
    pub bucket_name: String,
    /// Requested credential scope.
    pub access: AccessMode,
}

/// Short-lived storage credentials returned by the access manager.
///
/// Immutable once received; consumed exactly once to build a
/// [`StorageConfig`](crate::config::StorageConfig) snapshot.
#[derive(Clone, PartialEq, Eq)]
pub struct VendedCredentials {
    /// Access key identifier.
    pub access_key_id: String,
    /// Access key secret.
    pub secret_access_key: String,
    /// STS session token.
    pub session_token: String,
    /// Tenant KMS key backing server-side encryption for this collection.
    pub tenant_key_id: String,
    /// Verbatim ISO-8601 UTC expiration string from the wire.
    pub expiration_timestamp: String,
}

impl VendedCredentials {
    /// Parses the expiration timestamp into an instant.
    ///
    /// The wire format is `YYYY-MM-DDTHH:MM:SSZ` (RFC 3339). A malformed
    /// timestamp is treated as an already-expired instant: the handle built
    /// from these credentials is still handed to the caller that refreshed,
    /// but the next lookup re-fetches instead of trusting it forever.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        match DateTime::parse_from_rfc3339(&self.expiration_timestamp) {
            Ok(instant) => instant.with_timezone(&Utc),
            Err(err) => {
                tracing::warn!(
                    timestamp = %self.expiration_timestamp,
                    error = %err,
                    "malformed credential expiration, treating as already expired"
                );
                DateTime::<Utc>::MIN_UTC
            }
        }
    }
}

// Secrets must not leak through debug logging.
impl fmt::Debug for VendedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("tenant_key_id", &self.tenant_key_id)
            .field("expiration_timestamp", &self.expiration_timestamp)
            .finish()
    }
}

/// Source of vended credentials.
///
/// Implementations must be stateless with respect to requests: each call is
/// a single fetch with no internal retry loop. Retry policy belongs to the
/// embedding application.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetches fresh credentials for one collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CredentialFetch`](crate::Error::CredentialFetch) on
    /// transport failure or rejection by the remote authority.
    async fn fetch(&self, request: &CredentialRequest) -> Result<VendedCredentials>;
}
