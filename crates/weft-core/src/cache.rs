//! Credential-cached collection storage factory.
//!
//! [`CollectionStoreCache`] owns a mapping from collection id to
//! `(storage handle, expiration instant)`. An [`acquire`] call returns the
//! cached handle while its credentials are unexpired; otherwise it fetches
//! fresh credentials through the injected [`CredentialSource`], overlays them
//! on the config template, builds a new handle through the injected
//! [`StoreFactory`], and replaces the cache entry. When BYOK is disabled in
//! the template every caller gets the shared fallback handle and the cache is
//! never consulted.
//!
//! # Concurrency
//!
//! - The slot map is guarded by a synchronous mutex held only for
//!   lookup/insert, never across an `.await`.
//! - Each collection has its own slot with a refresh guard and a notifier,
//!   so concurrent misses for one collection coalesce into a single RPC and
//!   callers for distinct collections never wait on each other's refresh.
//! - The template is an `Arc` snapshot behind an `RwLock`: `init` swaps it
//!   atomically and readers never observe a torn config.
//!
//! # Invariants
//!
//! - A cache entry's expiration is the verbatim parse of the expiration
//!   timestamp returned by the credential call that produced the handle.
//! - A failed refresh leaves the slot's entry untouched; the next call
//!   retries instead of reusing a stale handle.
//!
//! [`acquire`]: CollectionStoreCache::acquire

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};
use tokio::sync::{Mutex, Notify};
use tracing::Instrument;

use crate::collection::CollectionId;
use crate::config::StorageConfig;
use crate::credentials::{AccessMode, CredentialRequest, CredentialSource};
use crate::error::{Error, Result};
use crate::observability::vending_span;
use crate::storage::{ObjectStore, StoreFactory};

/// A cached storage handle together with its credential expiry.
#[derive(Clone)]
struct CacheEntry {
    store: Arc<dyn ObjectStore>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Mutable per-collection state.
///
/// `entry` is only ever replaced by a successful refresh. `last_error`
/// records the most recent failed refresh so coalesced waiters can report
/// why no handle materialized.
#[derive(Default)]
struct SlotState {
    entry: Option<CacheEntry>,
    last_error: Option<String>,
}

/// Per-collection slot: entry state plus single-flight refresh machinery.
#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
    // If this lock is held, a refresh for the collection is in flight.
    refresh: Mutex<()>,
    // Wakes callers awaiting the in-flight refresh outcome.
    notify: Notify,
}

/// Credential-cached factory for collection-scoped storage handles.
///
/// Owned by the embedding application as an explicit context object and
/// safe to share across tasks.
///
/// # Example
///
/// ```rust,ignore
/// let cache = CollectionStoreCache::new(source, factory, shared);
/// cache.init(config);
///
/// let store = cache
///     .acquire(&CollectionId::new("col-1")?, "inst-a", AccessMode::ReadOnly)
///     .await?;
/// ```
pub struct CollectionStoreCache {
    template: RwLock<Option<Arc<StorageConfig>>>,
    slots: StdMutex<HashMap<CollectionId, Arc<Slot>>>,
    source: Arc<dyn CredentialSource>,
    factory: Arc<dyn StoreFactory>,
    shared: Arc<dyn ObjectStore>,
}

impl CollectionStoreCache {
    /// Creates a cache from its injected collaborators.
    ///
    /// `shared` is the non-isolated fallback handle returned whenever BYOK
    /// is disabled in the template.
    #[must_use]
    pub fn new(
        source: Arc<dyn CredentialSource>,
        factory: Arc<dyn StoreFactory>,
        shared: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            template: RwLock::new(None),
            slots: StdMutex::new(HashMap::new()),
            source,
            factory,
            shared,
        }
    }

    /// Sets or replaces the storage config template.
    ///
    /// Must be called before [`acquire`](Self::acquire). Calling again swaps
    /// the template atomically; existing cache entries stay valid until
    /// their own expiration.
    pub fn init(&self, config: StorageConfig) {
        tracing::info!(
            bucket = %config.bucket_name,
            byok_enabled = config.byok_enabled,
            "initializing collection store cache"
        );
        let mut template = self
            .template
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *template = Some(Arc::new(config));
    }

    /// Returns a ready-to-use storage handle for a collection.
    ///
    /// Cache hits return without any RPC. Misses and expired entries refresh
    /// through the credential source, with at most one refresh in flight per
    /// collection; concurrent callers for the same collection await the
    /// in-flight outcome.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] if [`init`](Self::init) has not been
    ///   called; a programming error, not a transient condition.
    /// - [`Error::CredentialsUnavailable`] if the credential fetch failed.
    ///   The cache entry for the collection is left unchanged so a later
    ///   call retries.
    /// - [`Error::Storage`] if the store factory rejected the snapshot.
    pub async fn acquire(
        &self,
        collection: &CollectionId,
        instance_name: &str,
        access: AccessMode,
    ) -> Result<Arc<dyn ObjectStore>> {
        let template = self.template()?;

        if !template.byok_enabled {
            tracing::debug!(%collection, "byok disabled, using shared store");
            return Ok(Arc::clone(&self.shared));
        }

        let slot = self.slot(collection);

        // Fast path: unexpired entry, no RPC.
        {
            let state = slot.state.lock().await;
            if let Some(entry) = state.entry.as_ref() {
                if entry.is_valid(Utc::now()) {
                    tracing::debug!(%collection, "store cache hit");
                    return Ok(Arc::clone(&entry.store));
                }
            }
        }

        // Create the notified future before trying for the refresh guard so
        // a notify_waiters between the two cannot be missed.
        let notified = slot.notify.notified();

        // Bound to a local so the guard, which borrows the slot, is dropped
        // before `slot` at the end of the function.
        let refresh_guard = slot.refresh.try_lock();
        match refresh_guard {
            Ok(guard) => {
                // A refresh may have completed between the fast path and
                // winning the guard.
                {
                    let state = slot.state.lock().await;
                    if let Some(entry) = state.entry.as_ref() {
                        if entry.is_valid(Utc::now()) {
                            return Ok(Arc::clone(&entry.store));
                        }
                    }
                }

                let outcome = self
                    .refresh(&template, collection, instance_name, access)
                    .instrument(vending_span("refresh", collection.as_str(), instance_name))
                    .await;

                {
                    let mut state = slot.state.lock().await;
                    match &outcome {
                        Ok(entry) => {
                            state.entry = Some(entry.clone());
                            state.last_error = None;
                        }
                        // Entry untouched: a later call retries the refresh
                        // rather than reusing a stale handle.
                        Err(Error::CredentialsUnavailable { message, .. }) => {
                            state.last_error = Some(message.clone());
                        }
                        Err(err) => state.last_error = Some(err.to_string()),
                    }
                }

                drop(guard);
                slot.notify.notify_waiters();

                outcome.map(|entry| entry.store)
            }
            Err(_) => {
                // A refresh is already in flight; await its outcome.
                notified.await;

                let state = slot.state.lock().await;
                match state.entry.as_ref() {
                    Some(entry) if entry.is_valid(Utc::now()) => Ok(Arc::clone(&entry.store)),
                    _ => Err(Error::unavailable(
                        collection.as_str(),
                        state
                            .last_error
                            .clone()
                            .unwrap_or_else(|| "refresh produced no usable handle".to_string()),
                    )),
                }
            }
        }
    }

    /// Drops slots whose entries have expired.
    ///
    /// Purely a memory-reclamation sweep for collections that are no longer
    /// queried; correctness never depends on it, since expired entries are
    /// detected lazily on access. Returns the number of slots removed.
    pub async fn purge_expired(&self) -> usize {
        let candidates: Vec<(CollectionId, Arc<Slot>)> = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots
                .iter()
                .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
                .collect()
        };

        let now = Utc::now();
        let mut stale = Vec::new();
        for (collection, slot) in candidates {
            let state = slot.state.lock().await;
            if matches!(state.entry.as_ref(), Some(entry) if !entry.is_valid(now)) {
                stale.push(collection);
            }
        }

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        for collection in stale {
            if slots.remove(&collection).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "purged expired store cache slots");
        }
        removed
    }

    fn template(&self) -> Result<Arc<StorageConfig>> {
        self.template
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::NotInitialized)
    }

    fn slot(&self, collection: &CollectionId) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(collection.clone()).or_default())
    }

    /// Fetches fresh credentials and builds a new cache entry.
    ///
    /// Fetch failures map to [`Error::CredentialsUnavailable`]; factory
    /// failures propagate as [`Error::Storage`].
    async fn refresh(
        &self,
        template: &StorageConfig,
        collection: &CollectionId,
        instance_name: &str,
        access: AccessMode,
    ) -> Result<CacheEntry> {
        tracing::info!(%collection, "refreshing vended credentials");

        let request = CredentialRequest {
            collection_id: collection.clone(),
            instance_name: instance_name.to_string(),
            bucket_name: template.bucket_name.clone(),
            access,
        };

        let credentials = self.source.fetch(&request).await.map_err(|err| {
            tracing::warn!(%collection, error = %err, "credential fetch failed");
            Error::unavailable(collection.as_str(), err.to_string())
        })?;

        let snapshot = template.with_credentials(&credentials);
        let store = self.factory.create(&snapshot).await?;
        let expires_at = credentials.expires_at();

        tracing::info!(%collection, %expires_at, "cached new collection store");

        Ok(CacheEntry { store, expires_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::VendedCredentials;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Credential source returning a programmable expiration, or failing.
    struct FakeSource {
        calls: AtomicUsize,
        fail: std::sync::atomic::AtomicBool,
        expiration: StdMutex<String>,
    }

    impl FakeSource {
        fn with_expiration(expiration: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: std::sync::atomic::AtomicBool::new(false),
                expiration: StdMutex::new(expiration.to_string()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn set_expiration(&self, expiration: &str) {
            *self.expiration.lock().unwrap() = expiration.to_string();
        }
    }

    #[async_trait]
    impl CredentialSource for FakeSource {
        async fn fetch(&self, request: &CredentialRequest) -> Result<VendedCredentials> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::credential_fetch("access manager unavailable"));
            }
            Ok(VendedCredentials {
                access_key_id: format!("key-for-{}", request.collection_id),
                secret_access_key: "sk".to_string(),
                session_token: "st".to_string(),
                tenant_key_id: "kms".to_string(),
                expiration_timestamp: self.expiration.lock().unwrap().clone(),
            })
        }
    }

    /// Factory producing a fresh `MemoryStore` per snapshot.
    struct FakeFactory {
        created: AtomicUsize,
    }

    impl FakeFactory {
        fn new() -> Self {
            Self {
                created: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StoreFactory for FakeFactory {
        async fn create(&self, _config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MemoryStore::new()))
        }
    }

    fn byok_template(bucket: &str) -> StorageConfig {
        StorageConfig {
            bucket_name: bucket.to_string(),
            byok_enabled: true,
            ..StorageConfig::default()
        }
    }

    fn cache_with(source: Arc<FakeSource>) -> CollectionStoreCache {
        CollectionStoreCache::new(
            source,
            Arc::new(FakeFactory::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    fn col(id: &str) -> CollectionId {
        CollectionId::new(id).unwrap()
    }

    #[tokio::test]
    async fn acquire_before_init_fails_loudly() {
        let cache = cache_with(Arc::new(FakeSource::with_expiration(
            "2099-01-01T00:00:00Z",
        )));
        let result = cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await;
        assert!(matches!(result, Err(Error::NotInitialized)));
    }

    #[tokio::test]
    async fn byok_disabled_returns_shared_store_without_rpc() {
        let source = Arc::new(FakeSource::with_expiration("2099-01-01T00:00:00Z"));
        let shared: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new());
        let cache = CollectionStoreCache::new(
            source.clone(),
            Arc::new(FakeFactory::new()),
            Arc::clone(&shared),
        );
        cache.init(StorageConfig::default());

        let store = cache
            .acquire(&col("col-2"), "inst-a", AccessMode::ReadWrite)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&store, &shared));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn repeated_acquire_hits_cache_with_one_rpc() {
        let source = Arc::new(FakeSource::with_expiration("2099-01-01T00:00:00Z"));
        let cache = cache_with(source.clone());
        cache.init(byok_template("b1"));

        let first = cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();
        let second = cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refreshed_with_a_new_handle() {
        let source = Arc::new(FakeSource::with_expiration("2000-01-01T00:00:00Z"));
        let cache = cache_with(source.clone());
        cache.init(byok_template("b1"));

        let first = cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();
        assert_eq!(source.calls(), 1);

        // The entry was cached already expired, so the next call refreshes.
        source.set_expiration("2099-01-01T00:00:00Z");
        let second = cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn malformed_expiration_forces_refetch_on_next_call() {
        let source = Arc::new(FakeSource::with_expiration("not-a-date"));
        let cache = cache_with(source.clone());
        cache.init(byok_template("b1"));

        // The refreshing caller still gets a handle.
        cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();
        assert_eq!(source.calls(), 1);

        cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_returns_unavailable_and_leaves_entry_alone() {
        let source = Arc::new(FakeSource::with_expiration("2000-01-01T00:00:00Z"));
        let cache = cache_with(source.clone());
        cache.init(byok_template("b1"));

        // Populate an (already expired) entry.
        cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();

        source.set_fail(true);
        let result = cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await;
        assert!(matches!(result, Err(Error::CredentialsUnavailable { .. })));

        // The slot still refreshes once the source recovers.
        source.set_fail(false);
        source.set_expiration("2099-01-01T00:00:00Z");
        cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn reinit_swaps_template_without_invalidating_entries() {
        let source = Arc::new(FakeSource::with_expiration("2099-01-01T00:00:00Z"));
        let cache = cache_with(source.clone());
        cache.init(byok_template("b1"));

        let first = cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();

        cache.init(byok_template("b2"));
        let second = cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 1);
    }

    /// Layer recording the names of spans as they are created.
    struct SpanRecorder(Arc<StdMutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanRecorder {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0
                .lock()
                .unwrap()
                .push(attrs.metadata().name().to_string());
        }
    }

    #[tokio::test]
    async fn refresh_runs_inside_vending_span() {
        use tracing_subscriber::layer::SubscriberExt;

        let recorded = Arc::new(StdMutex::new(Vec::new()));
        let subscriber =
            tracing_subscriber::registry().with(SpanRecorder(Arc::clone(&recorded)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let source = Arc::new(FakeSource::with_expiration("2099-01-01T00:00:00Z"));
        let cache = cache_with(source);
        cache.init(byok_template("b1"));
        cache
            .acquire(&col("col-1"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();

        let names = recorded.lock().unwrap();
        assert!(
            names.iter().any(|name| name == "vending"),
            "refresh should run inside the vending span, saw {names:?}"
        );
    }

    #[tokio::test]
    async fn purge_drops_only_expired_slots() {
        let source = Arc::new(FakeSource::with_expiration("2000-01-01T00:00:00Z"));
        let cache = cache_with(source.clone());
        cache.init(byok_template("b1"));

        cache
            .acquire(&col("expired"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();

        source.set_expiration("2099-01-01T00:00:00Z");
        cache
            .acquire(&col("live"), "inst-a", AccessMode::ReadOnly)
            .await
            .unwrap();

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.purge_expired().await, 0);
    }
}
