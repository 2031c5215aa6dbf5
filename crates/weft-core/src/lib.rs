//! # weft-core
//!
//! Credential-vended, collection-scoped storage handle cache.
//!
//! Callers performing storage I/O against per-collection buckets need
//! short-lived credentials from a remote access manager. This crate hides
//! the issuance, expiry tracking, and RPC plumbing behind one call:
//!
//! - **Collection Store Cache**: `acquire` returns a ready-to-use handle,
//!   fetching and caching credentials transparently and refreshing on expiry
//! - **Access Manager Client**: stateless gRPC wrapper for the credential
//!   vending service
//! - **Storage Seams**: the handle trait and factory trait implemented by
//!   concrete cloud backends outside this crate
//! - **Shared Fallback**: when per-collection isolation (BYOK) is disabled,
//!   every caller gets one shared handle and no credentials are vended
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weft_core::prelude::*;
//!
//! let source = Arc::new(AccessManagerClient::connect_lazy("http://access-manager:7020")?);
//! let cache = CollectionStoreCache::new(source, factory, shared);
//! cache.init(config);
//!
//! let store = cache
//!     .acquire(&CollectionId::new("col-1")?, "inst-a", AccessMode::ReadOnly)
//!     .await?;
//! let bytes = store.get("segments/1").await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod client;
pub mod collection;
pub mod config;
pub mod credentials;
pub mod error;
pub mod observability;
pub mod storage;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use weft_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::CollectionStoreCache;
    pub use crate::client::AccessManagerClient;
    pub use crate::collection::CollectionId;
    pub use crate::config::StorageConfig;
    pub use crate::credentials::{AccessMode, CredentialRequest, CredentialSource, VendedCredentials};
    pub use crate::error::{Error, Result};
    pub use crate::storage::{MemoryStore, ObjectStore, StoreFactory};
}

// Re-export key types at crate root for ergonomics
pub use cache::CollectionStoreCache;
pub use client::{AccessManagerClient, DEFAULT_FETCH_TIMEOUT};
pub use collection::CollectionId;
pub use config::StorageConfig;
pub use credentials::{AccessMode, CredentialRequest, CredentialSource, VendedCredentials};
pub use error::{Error, Result};
pub use observability::{LogFormat, init_logging};
pub use storage::{MemoryStore, ObjectStore, StoreFactory};
