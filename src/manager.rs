//! The settings manager contract shared by every backend.
//!
//! A manager owns a [`SettingsCache`] that the host reads and mutates
//! directly. Backends differ only in how [`SettingsManager::init`] hydrates
//! the cache and how [`SettingsManager::update`] persists one namespace.

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StoreError;

/// Settings object for one namespace.
pub type Settings = Map<String, Value>;

/// A write that has been issued but may not have reached storage yet.
///
/// Resolves once the backend has persisted (or failed to persist) the
/// value captured when [`SettingsManager::update`] was called.
pub type PendingWrite = BoxFuture<'static, Result<(), StoreError>>;

/// Check that a namespace can be used as a storage key.
///
/// Only the empty string is rejected. SQLite does not enforce the declared
/// `VARCHAR(20)` width, and every hydrated key must stay writable.
pub fn validate_namespace(namespace: &str) -> Result<(), StoreError> {
    if namespace.is_empty() {
        return Err(StoreError::InvalidNamespace {
            namespace: namespace.to_owned(),
            reason: "namespace cannot be empty",
        });
    }
    Ok(())
}

/// Shared in-memory mapping from namespace to settings object.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct SettingsCache {
    inner: Arc<RwLock<HashMap<String, Settings>>>,
}

impl SettingsCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Settings>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Settings>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the settings for a namespace.
    pub fn get(&self, namespace: &str) -> Option<Settings> {
        self.read().get(namespace).cloned()
    }

    /// Replace the settings for a namespace, returning the previous value.
    pub fn insert(&self, namespace: impl Into<String>, settings: Settings) -> Option<Settings> {
        self.write().insert(namespace.into(), settings)
    }

    /// Drop a namespace from the cache.
    pub fn remove(&self, namespace: &str) -> Option<Settings> {
        self.write().remove(namespace)
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.read().contains_key(namespace)
    }

    /// Cached namespaces in lexicographic order.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Mutate the settings for a namespace in place.
    ///
    /// An absent namespace starts out as an empty object.
    pub fn update_with<R>(&self, namespace: &str, f: impl FnOnce(&mut Settings) -> R) -> R {
        let mut cache = self.write();
        let settings = cache.entry(namespace.to_owned()).or_default();
        f(settings)
    }

    /// Serialize the current value for a namespace.
    pub(crate) fn encode(&self, namespace: &str) -> Result<String, StoreError> {
        let cache = self.read();
        let settings = cache
            .get(namespace)
            .ok_or_else(|| StoreError::MissingNamespace(namespace.to_owned()))?;
        serde_json::to_string(settings).map_err(|source| StoreError::Encode {
            namespace: namespace.to_owned(),
            source,
        })
    }
}

/// A pluggable settings backend.
///
/// Hosts call [`init`](Self::init) once during startup, read and mutate
/// [`settings`](Self::settings) freely afterwards, and call
/// [`update`](Self::update) whenever a namespace should be persisted.
/// Calling `init` concurrently from several tasks is not supported.
#[async_trait]
pub trait SettingsManager: Send + Sync {
    /// The in-memory cache owned by this manager.
    fn settings(&self) -> &SettingsCache;

    /// Prepare the backend and hydrate the cache.
    async fn init(&self) -> Result<(), StoreError>;

    /// Persist the current cached value for `namespace`.
    ///
    /// Contract violations (uninitialized store, unknown or invalid
    /// namespace) fail immediately. Storage failures surface through the
    /// returned [`PendingWrite`].
    fn update(&self, namespace: &str) -> Result<PendingWrite, StoreError>;

    /// Whether [`update`](Self::update) is currently accepted.
    fn is_ready(&self) -> bool {
        true
    }

    /// Read a single key from a namespace.
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        self.settings()
            .get(namespace)
            .and_then(|mut settings| settings.remove(key))
    }

    /// Set a single key and wait for the namespace to be persisted.
    ///
    /// Fails without touching the cache when the manager is not ready.
    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), StoreError> {
        if !self.is_ready() {
            return Err(StoreError::Uninitialized);
        }
        validate_namespace(namespace)?;
        self.settings().update_with(namespace, |settings| {
            settings.insert(key.to_owned(), value);
        });
        self.update(namespace)?.await
    }

    /// Remove a single key, persisting the namespace if the key existed.
    async fn unset(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        if !self.is_ready() {
            return Err(StoreError::Uninitialized);
        }
        if !self.settings().contains(namespace) {
            return Ok(None);
        }
        let removed = self
            .settings()
            .update_with(namespace, |settings| settings.remove(key));
        if removed.is_some() {
            self.update(namespace)?.await?;
        }
        Ok(removed)
    }

    /// Reset a namespace to an empty object and persist it.
    async fn clear(&self, namespace: &str) -> Result<(), StoreError> {
        if !self.is_ready() {
            return Err(StoreError::Uninitialized);
        }
        validate_namespace(namespace)?;
        self.settings().insert(namespace, Settings::new());
        self.update(namespace)?.await
    }
}

/// A backend that keeps settings in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsManager {
    cache: SettingsCache,
}

impl MemorySettingsManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsManager for MemorySettingsManager {
    fn settings(&self) -> &SettingsCache {
        &self.cache
    }

    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn update(&self, namespace: &str) -> Result<PendingWrite, StoreError> {
        validate_namespace(namespace)?;
        if !self.cache.contains(namespace) {
            return Err(StoreError::MissingNamespace(namespace.to_owned()));
        }
        Ok(future::ok(()).boxed())
    }
}
