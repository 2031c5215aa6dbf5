//! Error types and result alias for weft.
//!
//! Errors are structured for programmatic handling: a caller that cannot
//! obtain a storage handle sees [`Error::CredentialsUnavailable`], which is
//! distinguishable from any I/O failure raised later by the handle itself.

/// The result type used throughout weft.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while vending collection storage handles.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Description of what made the ID invalid.
        message: String,
    },

    /// An endpoint URI could not be parsed.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The cache was used before [`init`](crate::cache::CollectionStoreCache::init).
    ///
    /// This is a programming error in the embedding application, not a
    /// transient condition; retrying without calling `init` will never
    /// succeed.
    #[error("storage config template not set: call init() before acquire()")]
    NotInitialized,

    /// The access manager rejected a credential request, or the call to it
    /// failed at the transport level.
    #[error("credential fetch failed: {message}")]
    CredentialFetch {
        /// Status message from the transport or the remote authority.
        message: String,
    },

    /// No storage handle could be produced for a collection.
    ///
    /// Returned from the `acquire` boundary instead of propagating the raw
    /// fetch failure. The cache state for the collection is left unchanged,
    /// so a later call retries the refresh.
    #[error("credentials unavailable for collection {collection}: {message}")]
    CredentialsUnavailable {
        /// The collection the caller asked for.
        collection: String,
        /// Why the refresh did not produce a handle.
        message: String,
    },

    /// A storage handle could not be constructed from a config snapshot.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a credential fetch error with the given status message.
    #[must_use]
    pub fn credential_fetch(message: impl Into<String>) -> Self {
        Self::CredentialFetch {
            message: message.into(),
        }
    }

    /// Creates a credentials-unavailable error for a collection.
    #[must_use]
    pub fn unavailable(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CredentialsUnavailable {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Creates a storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
