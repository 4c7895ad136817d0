//! Scope management
//!
//! Scoped services are cached per scope id. At most one scope is active at a
//! time; beginning another scope only moves the active pointer, and the
//! previous scope's cache is kept until that scope is ended (or the container
//! is cleared). There is no nested scope stack.

use crate::Container;
use crate::factory::Instance;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Scope identifier.
///
/// Any string works (`"request-42"`, a test name, ...). Use
/// [`ScopeId::unique`] when the caller has no natural id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(String);

impl ScopeId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a process-unique id of the form `scope-<n>`
    pub fn unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(format!("scope-{}", COUNTER.fetch_add(1, Ordering::Relaxed)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ScopeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Instances owned by one scope
#[derive(Debug, Default)]
pub(crate) struct ScopeCache {
    instances: DashMap<String, Instance, RandomState>,
}

impl ScopeCache {
    #[inline]
    pub fn get(&self, key: &str) -> Option<Instance> {
        self.instances.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Store `instance` unless one is already cached; returns the cached one
    pub fn get_or_insert(&self, key: &str, instance: Instance) -> Instance {
        Arc::clone(
            self.instances
                .entry(key.to_string())
                .or_insert(instance)
                .value(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

/// Active scope pointer plus every scope cache that has not been ended
#[derive(Debug, Default)]
pub(crate) struct ScopeManager {
    active: RwLock<Option<ScopeId>>,
    caches: DashMap<ScopeId, Arc<ScopeCache>, RandomState>,
}

impl ScopeManager {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` the active scope, resuming its cache if it still exists
    pub fn begin(&self, id: ScopeId) -> Option<ScopeId> {
        let mut active = self.active.write();
        self.caches.entry(id.clone()).or_default();
        active.replace(id)
    }

    /// Drop the active scope's cache and clear the pointer.
    /// Returns the ended id and how many instances its cache held.
    pub fn end(&self) -> Option<(ScopeId, usize)> {
        let mut active = self.active.write();
        let id = active.take()?;
        let dropped = self
            .caches
            .remove(&id)
            .map(|(_, cache)| cache.len())
            .unwrap_or(0);
        Some((id, dropped))
    }

    /// Drop the cache of `id`; ends it if it is the active scope
    pub fn discard(&self, id: &ScopeId) -> usize {
        let mut active = self.active.write();
        if active.as_ref() == Some(id) {
            *active = None;
        }
        self.caches
            .remove(id)
            .map(|(_, cache)| cache.len())
            .unwrap_or(0)
    }

    #[inline]
    pub fn active(&self) -> Option<ScopeId> {
        self.active.read().clone()
    }

    /// Cache of the active scope, if one is open
    pub fn active_cache(&self) -> Option<Arc<ScopeCache>> {
        let active = self.active.read();
        let id = active.as_ref()?;
        let cache = self.caches.entry(id.clone()).or_default();
        Some(Arc::clone(cache.value()))
    }

    /// Number of scopes whose cache is still held
    #[inline]
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Drop every scope cache; the active pointer is kept
    pub fn clear(&self) {
        let _active = self.active.write();
        self.caches.clear();
    }
}

/// Ends its scope when dropped.
///
/// Created by [`Container::enter_scope`]. If another scope was begun in the
/// meantime, dropping the guard discards this scope's cache without touching
/// the newer active scope.
///
/// # Example
///
/// ```rust
/// use service_container::{Container, Registration};
/// use std::sync::Arc;
///
/// struct RequestContext;
///
/// let container = Container::new();
/// container.register("ctx", Registration::factory(|_| Ok(RequestContext)).scoped());
///
/// {
///     let _scope = container.enter_scope("request-1");
///     let a = container.get::<RequestContext>("ctx").unwrap();
///     let b = container.get::<RequestContext>("ctx").unwrap();
///     assert!(Arc::ptr_eq(&a, &b));
/// }
///
/// assert!(container.active_scope().is_none());
/// ```
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard<'a> {
    container: &'a Container,
    id: ScopeId,
}

impl<'a> ScopeGuard<'a> {
    pub(crate) fn new(container: &'a Container, id: ScopeId) -> Self {
        Self { container, id }
    }

    /// The scope this guard owns
    #[inline]
    pub fn id(&self) -> &ScopeId {
        &self.id
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.container.discard_scope(&self.id);
    }
}

impl std::fmt::Debug for ScopeGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard").field("id", &self.id).finish()
    }
}
