//! Registry and singleton cache storage
//!
//! Uses DashMap for concurrent access. No map guard is ever held while a
//! factory runs: lookups clone the `Arc` out and drop the guard immediately.

use crate::Registration;
use crate::factory::Instance;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Registration entries plus the singleton instance cache
pub(crate) struct ServiceStorage {
    /// Map from service key to its registration entry
    registrations: DashMap<String, Arc<Registration>, RandomState>,
    /// Keys in first-registration order; also serializes insert/clear
    order: Mutex<Vec<String>>,
    /// Lazily built singleton instances
    singletons: DashMap<String, Instance, RandomState>,
}

impl ServiceStorage {
    /// Create new empty storage.
    ///
    /// Uses 8 shards: containers rarely hold more than a few dozen services.
    #[inline]
    pub fn new() -> Self {
        Self {
            registrations: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
            order: Mutex::new(Vec::new()),
            singletons: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
        }
    }

    /// Insert or overwrite an entry. Returns `true` if the key was already
    /// registered. Cached instances are left untouched.
    pub fn insert(&self, key: String, registration: Registration) -> bool {
        let mut order = self.order.lock();
        let replaced = self
            .registrations
            .insert(key.clone(), Arc::new(registration))
            .is_some();
        if !replaced {
            order.push(key);
        }
        replaced
    }

    /// Registration entry for `key`
    #[inline]
    pub fn registration(&self, key: &str) -> Option<Arc<Registration>> {
        self.registrations.get(key).map(|entry| Arc::clone(entry.value()))
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.registrations.contains_key(key)
    }

    /// Registered keys in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.order.lock().clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Cached singleton for `key`, if one was built
    #[inline]
    pub fn cached_singleton(&self, key: &str) -> Option<Instance> {
        self.singletons.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Store a freshly built singleton. If another caller stored one first,
    /// that one is kept and returned instead.
    pub fn cache_singleton(&self, key: &str, instance: Instance) -> Instance {
        Arc::clone(
            self.singletons
                .entry(key.to_string())
                .or_insert(instance)
                .value(),
        )
    }

    /// Number of singletons built so far
    #[inline]
    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }

    /// Drop every registration and cached singleton
    pub fn clear(&self) {
        let mut order = self.order.lock();
        self.registrations.clear();
        self.singletons.clear();
        order.clear();
    }
}

impl Default for ServiceStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceStorage")
            .field("registrations", &self.len())
            .field("singletons", &self.singleton_count())
            .finish()
    }
}
