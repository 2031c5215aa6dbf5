//! Storage configuration template and credential-overlay snapshots.
//!
//! The embedding application owns one [`StorageConfig`] describing the
//! non-credential storage parameters shared by every collection (bucket,
//! endpoint, path layout). The cache holds it as a write-once-per-`init`
//! template and derives an immutable snapshot per successful credential
//! refresh via [`StorageConfig::with_credentials`]; the snapshot is consumed
//! by the store factory and then discarded.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::credentials::VendedCredentials;

/// Storage parameters for building collection storage handles.
///
/// In the template the five credential fields are empty; a snapshot carries
/// the credential material from exactly one refresh.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Object storage endpoint (host or host:port).
    pub endpoint: String,

    /// Bucket shared by every collection.
    pub bucket_name: String,

    /// Path prefix under which collection data lives.
    pub root_path: String,

    /// Storage region, when the provider needs one.
    pub region: String,

    /// Whether to use TLS when talking to the storage endpoint.
    pub use_ssl: bool,

    /// Whether per-collection credential isolation (BYOK) is enabled.
    ///
    /// When false the cache never vends credentials and every caller gets
    /// the shared fallback handle.
    pub byok_enabled: bool,

    /// Access key identifier (credential overlay).
    pub access_key_id: String,

    /// Access key secret (credential overlay).
    pub secret_access_key: String,

    /// STS session token (credential overlay).
    pub session_token: String,

    /// Tenant KMS key id (credential overlay).
    pub tenant_key_id: String,

    /// Verbatim expiration string of the overlaid credentials.
    pub expiration_timestamp: String,
}

impl StorageConfig {
    /// Builds a snapshot of this template with the credential fields
    /// overwritten by a vended credential record.
    ///
    /// The template itself is never mutated.
    #[must_use]
    pub fn with_credentials(&self, credentials: &VendedCredentials) -> Self {
        let mut snapshot = self.clone();
        snapshot.access_key_id = credentials.access_key_id.clone();
        snapshot.secret_access_key = credentials.secret_access_key.clone();
        snapshot.session_token = credentials.session_token.clone();
        snapshot.tenant_key_id = credentials.tenant_key_id.clone();
        snapshot.expiration_timestamp = credentials.expiration_timestamp.clone();
        snapshot
    }
}

// Secrets must not leak through debug logging.
impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket_name", &self.bucket_name)
            .field("root_path", &self.root_path)
            .field("region", &self.region)
            .field("use_ssl", &self.use_ssl)
            .field("byok_enabled", &self.byok_enabled)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("tenant_key_id", &self.tenant_key_id)
            .field("expiration_timestamp", &self.expiration_timestamp)
            .finish()
    }
}
