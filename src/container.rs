//! Keyed service container
//!
//! The `Container` stores registration entries by string key and resolves them
//! by walking their dependency lists, caching instances according to each
//! entry's [`Lifecycle`] and rejecting cyclic graphs.

use crate::factory::{Dependencies, Instance};
use crate::resolver::ResolutionStack;
use crate::scope::{ScopeCache, ScopeGuard, ScopeId, ScopeManager};
use crate::settings::Settings;
use crate::storage::ServiceStorage;
use crate::{DiError, Injectable, Lifecycle, ProviderRegistration, Registration, Result};
use parking_lot::ReentrantMutex;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Service container keyed by string.
///
/// Cloning is cheap and every clone shares the same registry, caches, scopes
/// and settings.
///
/// Cache hits are lock-free. Anything that has to construct a service runs
/// under one container-wide reentrant lock, as does [`Container::clear`], so a
/// singleton or scoped factory runs at most once per cache even when many
/// threads race on a cold key. A factory may resolve from the same container
/// on its own thread, but must not block on another thread that does.
///
/// # Examples
///
/// ```rust
/// use service_container::{Container, Registration};
/// use std::sync::Arc;
///
/// struct Logger;
/// struct Repo { logger: Arc<Logger> }
///
/// let container = Container::new();
/// container.register("Logger", Registration::factory(|_| Ok(Logger)));
/// container.register(
///     "Repo",
///     Registration::factory(|deps| Ok(Repo { logger: deps.get(0)? })).depends_on(["Logger"]),
/// );
///
/// let repo = container.get::<Repo>("Repo").unwrap();
/// let logger = container.get::<Logger>("Logger").unwrap();
/// assert!(Arc::ptr_eq(&repo.logger, &logger));
/// ```
#[derive(Clone)]
pub struct Container {
    /// Registry and singleton cache
    storage: Arc<ServiceStorage>,
    /// Scoped caches and the active scope pointer
    scopes: Arc<ScopeManager>,
    /// Ambient configuration handed to factories
    settings: Arc<Settings>,
    /// Held for every cold resolve and for `clear`
    construction: Arc<ReentrantMutex<()>>,
}

impl Container {
    /// Create an empty container with empty settings.
    #[inline]
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Create an empty container carrying `settings`.
    ///
    /// Settings are fixed for the container's lifetime and reach factories
    /// through [`Dependencies::settings`].
    pub fn with_settings(settings: Settings) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            settings = settings.len(),
            "Creating new service container"
        );

        Self {
            storage: Arc::new(ServiceStorage::new()),
            scopes: Arc::new(ScopeManager::new()),
            settings: Arc::new(settings),
            construction: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// Ambient configuration of this container
    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub(crate) fn shared_settings(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register (or overwrite) the entry for `key`.
    ///
    /// Overwriting does not evict instances already cached for `key`; only
    /// [`Container::clear`] does.
    pub fn register(&self, key: impl Into<String>, registration: Registration) {
        let key = key.into();

        #[cfg(feature = "logging")]
        let (lifecycle, dependencies) = (
            registration.lifecycle(),
            registration.dependencies().len(),
        );

        let replaced = self.storage.insert(key.clone(), registration);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            service = %key,
            lifecycle = lifecycle.as_str(),
            dependencies,
            replaced,
            service_count = self.storage.len(),
            "Registering service"
        );

        #[cfg(not(feature = "logging"))]
        let _ = (key, replaced);
    }

    /// Register a singleton built by `factory`
    #[inline]
    pub fn singleton<T, F, I, S>(&self, key: impl Into<String>, dependencies: I, factory: F)
    where
        T: Injectable,
        F: Fn(&Dependencies) -> std::result::Result<T, crate::BoxError> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(key, Registration::factory(factory).depends_on(dependencies));
    }

    /// Register a scoped service built by `factory`
    #[inline]
    pub fn scoped<T, F, I, S>(&self, key: impl Into<String>, dependencies: I, factory: F)
    where
        T: Injectable,
        F: Fn(&Dependencies) -> std::result::Result<T, crate::BoxError> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(
            key,
            Registration::factory(factory).scoped().depends_on(dependencies),
        );
    }

    /// Register a transient service built by `factory`
    #[inline]
    pub fn transient<T, F, I, S>(&self, key: impl Into<String>, dependencies: I, factory: F)
    where
        T: Injectable,
        F: Fn(&Dependencies) -> std::result::Result<T, crate::BoxError> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(
            key,
            Registration::factory(factory).transient().depends_on(dependencies),
        );
    }

    /// Register a ready-made value under `key`
    #[inline]
    pub fn instance<T: Injectable>(&self, key: impl Into<String>, value: T) {
        self.register(key, Registration::instance(value));
    }

    /// Register every line of a bootstrap list, in order.
    pub fn install(&self, providers: &[ProviderRegistration]) {
        for provider in providers {
            provider.apply(self);
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            providers = providers.len(),
            service_count = self.storage.len(),
            "Bootstrap list installed"
        );
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve `key` to a type-erased instance.
    ///
    /// Dependencies are resolved first, in declaration order. Singletons are
    /// built once; scoped entries once per active scope; transients every
    /// time. Any failure aborts the whole call.
    pub fn resolve(&self, key: &str) -> Result<Instance> {
        if let Some(instance) = self.cached_for(key) {
            return Ok(instance);
        }

        let _construction = self.construction.lock();
        let mut stack = ResolutionStack::new();
        self.resolve_tracked(key, &mut stack)
    }

    /// Resolve `key` and downcast it to `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_container::{Container, DiError};
    ///
    /// let container = Container::new();
    /// container.instance("answer", 42u32);
    ///
    /// assert_eq!(*container.get::<u32>("answer").unwrap(), 42);
    /// assert!(matches!(
    ///     container.get::<String>("answer"),
    ///     Err(DiError::TypeMismatch { .. })
    /// ));
    /// ```
    pub fn get<T: Injectable>(&self, key: &str) -> Result<Arc<T>> {
        self.resolve(key)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(key))
    }

    /// Resolve, returning None on any failure.
    #[inline]
    pub fn try_get<T: Injectable>(&self, key: &str) -> Option<Arc<T>> {
        self.get::<T>(key).ok()
    }

    /// One resolution frame. `stack` holds the keys being constructed above us.
    fn resolve_tracked(&self, key: &str, stack: &mut ResolutionStack) -> Result<Instance> {
        let registration = self.storage.registration(key).ok_or_else(|| {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                service = key,
                depth = stack.depth(),
                "Service not registered"
            );
            DiError::not_registered(key)
        })?;

        let lifecycle = registration.lifecycle();
        let scope_cache = match lifecycle {
            Lifecycle::Scoped => self.scopes.active_cache(),
            Lifecycle::Singleton | Lifecycle::Transient => None,
        };

        if let Some(cached) = self.cached(key, lifecycle, scope_cache.as_deref()) {
            #[cfg(feature = "logging")]
            trace!(
                target: "service_container",
                service = key,
                lifecycle = lifecycle.as_str(),
                "Service resolved from cache"
            );
            return Ok(cached);
        }

        let mut frame = stack.enter(key)?;

        let mut resolved = Vec::with_capacity(registration.dependencies().len());
        for dependency in registration.dependencies() {
            #[cfg(feature = "logging")]
            trace!(
                target: "service_container",
                service = key,
                dependency = %dependency,
                "Resolving dependency"
            );

            let instance = self.resolve_tracked(dependency, &mut frame)?;
            resolved.push((dependency.clone(), instance));
        }

        let deps = Dependencies::new(resolved, Arc::clone(&self.settings));
        let instance = registration.build(key, &deps)?;

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            service = key,
            lifecycle = lifecycle.as_str(),
            dependencies = deps.len(),
            scoped = scope_cache.is_some(),
            "Constructed service"
        );

        Ok(match (lifecycle, scope_cache) {
            (Lifecycle::Singleton, _) => self.storage.cache_singleton(key, instance),
            (Lifecycle::Scoped, Some(cache)) => cache.get_or_insert(key, instance),
            // scoped with no open scope behaves as transient
            (Lifecycle::Scoped, None) | (Lifecycle::Transient, _) => instance,
        })
    }

    /// Lock-free lookup of an already cached instance for `key`
    fn cached_for(&self, key: &str) -> Option<Instance> {
        let lifecycle = self.storage.registration(key)?.lifecycle();
        let scope_cache = match lifecycle {
            Lifecycle::Scoped => Some(self.scopes.active_cache()?),
            Lifecycle::Singleton | Lifecycle::Transient => None,
        };
        self.cached(key, lifecycle, scope_cache.as_deref())
    }

    /// Cached instance for `key` under its lifecycle, if any
    #[inline]
    fn cached(
        &self,
        key: &str,
        lifecycle: Lifecycle,
        scope: Option<&ScopeCache>,
    ) -> Option<Instance> {
        match lifecycle {
            Lifecycle::Singleton => self.storage.cached_singleton(key),
            Lifecycle::Scoped => scope.and_then(|cache| cache.get(key)),
            Lifecycle::Transient => None,
        }
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check if a key is registered.
    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.storage.contains(key)
    }

    /// Alias for `has`.
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.has(key)
    }

    /// Registered keys in insertion order.
    #[inline]
    pub fn keys(&self) -> Vec<String> {
        self.storage.keys()
    }

    /// The registration entry for `key`.
    #[inline]
    pub fn registration(&self, key: &str) -> Option<Arc<Registration>> {
        self.storage.registration(key)
    }

    /// Number of registered keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of singletons built so far.
    #[inline]
    pub fn singleton_count(&self) -> usize {
        self.storage.singleton_count()
    }

    // =========================================================================
    // Scope Methods
    // =========================================================================

    /// Make `id` the active scope.
    ///
    /// Only one scope is active at a time. Beginning a new one while another
    /// is active just moves the pointer; the old scope's cache is kept and
    /// resumes if the same id is begun again.
    pub fn begin_scope(&self, id: impl Into<ScopeId>) {
        let id = id.into();

        #[cfg(feature = "logging")]
        let scope = id.to_string();

        let previous = self.scopes.begin(id);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            scope = %scope,
            previous = previous.as_ref().map(ScopeId::as_str),
            "Scope begun"
        );

        #[cfg(not(feature = "logging"))]
        let _ = previous;
    }

    /// End the active scope, dropping its cached instances.
    ///
    /// No teardown hook runs; instances are simply released. Returns the id
    /// of the scope that was ended, or `None` if no scope was active.
    pub fn end_scope(&self) -> Option<ScopeId> {
        let (id, dropped) = self.scopes.end()?;

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            scope = %id,
            instances_dropped = dropped,
            "Scope ended"
        );

        #[cfg(not(feature = "logging"))]
        let _ = dropped;

        Some(id)
    }

    /// Begin `id` and return a guard that ends it on drop.
    pub fn enter_scope(&self, id: impl Into<ScopeId>) -> ScopeGuard<'_> {
        let id = id.into();
        self.begin_scope(id.clone());
        ScopeGuard::new(self, id)
    }

    /// Drop the cache of `id`, ending it if it is still the active scope.
    pub(crate) fn discard_scope(&self, id: &ScopeId) {
        let dropped = self.scopes.discard(id);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            scope = %id,
            instances_dropped = dropped,
            "Scope discarded"
        );

        #[cfg(not(feature = "logging"))]
        let _ = dropped;
    }

    /// The active scope, if any.
    #[inline]
    pub fn active_scope(&self) -> Option<ScopeId> {
        self.scopes.active()
    }

    // =========================================================================
    // Lifecycle Methods
    // =========================================================================

    /// Remove every registration and drop every cached singleton and scoped
    /// instance.
    ///
    /// Instances already handed out are unaffected. The active scope pointer
    /// is kept, so an open scope starts caching again from empty.
    pub fn clear(&self) {
        // waits for in-flight constructions so none lands in the fresh caches
        let _construction = self.construction.lock();

        #[cfg(feature = "logging")]
        let (services, singletons) = (self.storage.len(), self.storage.singleton_count());

        self.storage.clear();
        self.scopes.clear();

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            services_removed = services,
            singletons_dropped = singletons,
            "Container cleared"
        );
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.len())
            .field("singletons", &self.singleton_count())
            .field("active_scope", &self.active_scope())
            .field("open_scopes", &self.scopes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, Construct};
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct Counter(u32);

    fn counting(counter: &'static AtomicU32) -> Registration {
        Registration::factory(move |_| Ok(Counter(counter.fetch_add(1, Ordering::SeqCst))))
    }

    #[test]
    fn test_singleton() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("counter", counting(&BUILT));

        let a = container.get::<Counter>("counter").unwrap();
        let b = container.get::<Counter>("counter").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
        assert_eq!(container.singleton_count(), 1);
    }

    #[test]
    fn test_transient() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("counter", counting(&BUILT).transient());

        let a = container.get::<Counter>("counter").unwrap();
        let b = container.get::<Counter>("counter").unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.0, b.0);
        assert_eq!(container.singleton_count(), 0);
    }

    #[test]
    fn test_scoped_without_scope_is_transient() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("counter", counting(&BUILT).scoped());

        let a = container.get::<Counter>("counter").unwrap();
        let b = container.get::<Counter>("counter").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_scoped_identity_per_scope() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("counter", counting(&BUILT).scoped());

        container.begin_scope("A");
        let a1 = container.get::<Counter>("counter").unwrap();
        let a2 = container.get::<Counter>("counter").unwrap();
        assert!(Arc::ptr_eq(&a1, &a2));

        assert_eq!(container.end_scope(), Some(ScopeId::new("A")));
        container.begin_scope("B");
        let b1 = container.get::<Counter>("counter").unwrap();
        assert!(!Arc::ptr_eq(&a1, &b1));
    }

    #[test]
    fn test_reopened_scope_resumes_cache() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("counter", counting(&BUILT).scoped());

        container.begin_scope("A");
        let a = container.get::<Counter>("counter").unwrap();

        container.begin_scope("B");
        let b = container.get::<Counter>("counter").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        container.begin_scope("A");
        let again = container.get::<Counter>("counter").unwrap();
        assert!(Arc::ptr_eq(&a, &again));
    }

    #[test]
    fn test_enter_scope_guard() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("counter", counting(&BUILT).scoped());

        let first = {
            let scope = container.enter_scope(ScopeId::unique());
            assert_eq!(container.active_scope().as_ref(), Some(scope.id()));
            container.get::<Counter>("counter").unwrap()
        };
        assert!(container.active_scope().is_none());

        let _scope = container.enter_scope("next");
        let second = container.get::<Counter>("counter").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_stale_guard_leaves_newer_scope_active() {
        let container = Container::new();

        let guard = container.enter_scope("old");
        container.begin_scope("new");
        drop(guard);

        assert_eq!(container.active_scope(), Some(ScopeId::new("new")));
    }

    #[test]
    fn test_not_registered_mutates_nothing() {
        let container = Container::new();
        container.instance("present", 1u8);

        let err = container.resolve("missing").unwrap_err();
        assert!(matches!(err, DiError::NotRegistered { ref key } if key == "missing"));
        assert_eq!(container.singleton_count(), 0);
        assert_eq!(container.keys(), ["present"]);
    }

    #[test]
    fn test_missing_dependency_fails_fast() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("first", counting(&BUILT));
        container.register(
            "needs",
            Registration::factory(|_| Ok(Counter(0))).depends_on(["first", "absent", "first"]),
        );

        let err = container.resolve("needs").unwrap_err();
        assert!(matches!(err, DiError::NotRegistered { ref key } if key == "absent"));
        // "first" was resolved before the failure, "needs" was never built
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
        assert_eq!(container.singleton_count(), 1);
    }

    #[test]
    fn test_three_node_cycle_then_clean_resolve() {
        let container = Container::new();
        container.singleton("A", ["B"], |_| Ok(Counter(1)));
        container.singleton("B", ["C"], |_| Ok(Counter(2)));
        container.singleton("C", ["A"], |_| Ok(Counter(3)));
        container.singleton("D", Vec::<String>::new(), |_| Ok(Counter(4)));

        match container.resolve("A").unwrap_err() {
            DiError::CircularDependency { key, path } => {
                assert_eq!(key, "A");
                assert_eq!(path, ["A", "B", "C", "A"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // nothing left on the tracking stack
        assert_eq!(container.get::<Counter>("D").unwrap().0, 4);
        assert_eq!(container.singleton_count(), 1);
    }

    #[test]
    fn test_self_dependency() {
        let container = Container::new();
        container.transient("Loop", ["Loop"], |_| Ok(Counter(0)));

        let err = container.resolve("Loop").unwrap_err();
        assert!(matches!(
            err,
            DiError::CircularDependency { ref path, .. } if path == &["Loop", "Loop"]
        ));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        struct Pair(Arc<Counter>, Arc<Counter>);

        let container = Container::new();
        container.singleton("leaf", Vec::<String>::new(), |_| Ok(Counter(9)));
        container.transient("left", ["leaf"], |deps| Ok(Counter(deps.get::<Counter>(0)?.0)));
        container.transient("right", ["leaf"], |deps| Ok(Counter(deps.get::<Counter>(0)?.0)));
        container.transient("top", ["left", "right"], |deps| {
            Ok(Pair(deps.get(0)?, deps.get(1)?))
        });

        let top = container.get::<Pair>("top").unwrap();
        assert_eq!(top.0.0, 9);
        assert_eq!(top.1.0, 9);
    }

    #[test]
    fn test_construction_failure_carries_key() {
        let container = Container::new();
        container.singleton("ok", Vec::<String>::new(), |_| Ok(Counter(0)));
        container.register(
            "broken",
            Registration::factory::<Counter, _>(|_| Err("vault path missing".into()))
                .depends_on(["ok"]),
        );

        match container.resolve("broken").unwrap_err() {
            DiError::ConstructionFailed { key, source } => {
                assert_eq!(key, "broken");
                assert_eq!(source.to_string(), "vault path missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(container.try_get::<Counter>("broken").is_none());
    }

    #[test]
    fn test_invalid_registration_surfaces_at_resolve() {
        let container = Container::new();
        container.register("empty", Registration::new().transient());

        assert!(container.has("empty"));
        assert!(matches!(
            container.resolve("empty"),
            Err(DiError::InvalidRegistration { ref key }) if key == "empty"
        ));
    }

    #[test]
    fn test_constructor_registration() {
        struct Greeter {
            greeting: String,
        }

        impl Construct for Greeter {
            fn construct(deps: &Dependencies) -> std::result::Result<Self, BoxError> {
                let name = deps.by_key::<String>("name")?;
                Ok(Greeter {
                    greeting: format!("hello {name}"),
                })
            }
        }

        let container = Container::new();
        container.instance("name", String::from("vault"));
        container.register("greeter", Registration::constructor::<Greeter>().depends_on(["name"]));

        assert_eq!(container.get::<Greeter>("greeter").unwrap().greeting, "hello vault");
    }

    #[test]
    fn test_settings_reach_factories() {
        struct Model(String);

        let container = Container::with_settings(Settings::new().set("ai_model", "small"));
        container.singleton("model", Vec::<String>::new(), |deps| {
            Ok(Model(deps.settings().get_or("ai_model", "default").to_string()))
        });

        assert_eq!(container.get::<Model>("model").unwrap().0, "small");
        assert_eq!(container.settings().get("ai_model"), Some("small"));
    }

    #[test]
    fn test_clear_drops_everything() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("single", counting(&BUILT));
        container.register("scoped", counting(&BUILT).scoped());
        container.begin_scope("A");

        let single = container.get::<Counter>("single").unwrap();
        let scoped = container.get::<Counter>("scoped").unwrap();

        container.clear();
        assert!(container.is_empty());
        assert!(container.keys().is_empty());
        assert!(matches!(
            container.resolve("single"),
            Err(DiError::NotRegistered { .. })
        ));

        container.register("single", counting(&BUILT));
        container.register("scoped", counting(&BUILT).scoped());

        assert!(!Arc::ptr_eq(&single, &container.get::<Counter>("single").unwrap()));
        assert!(!Arc::ptr_eq(&scoped, &container.get::<Counter>("scoped").unwrap()));
        // handed-out instances live on
        assert_ne!(single.0, scoped.0);
    }

    #[test]
    fn test_clones_share_state() {
        let container = Container::new();
        let other = container.clone();
        other.instance("shared", 5u16);

        assert!(container.has("shared"));
        assert_eq!(*container.get::<u16>("shared").unwrap(), 5);
    }

    fn slow_counting(counter: &'static AtomicU32) -> Registration {
        Registration::factory(move |_| {
            let id = counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            Ok(Counter(id))
        })
    }

    fn resolve_from_threads(container: &Container, key: &str, threads: usize) -> Vec<Arc<Counter>> {
        let barrier = Barrier::new(threads);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        container.get::<Counter>(key).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn test_concurrent_singleton_built_once() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("Vault", slow_counting(&BUILT));

        let resolved = resolve_from_threads(&container, "Vault", 4);

        for instance in &resolved[1..] {
            assert!(Arc::ptr_eq(&resolved[0], instance));
        }
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_scoped_built_once_per_scope() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("ctx", slow_counting(&BUILT).scoped());
        container.begin_scope("request");

        let resolved = resolve_from_threads(&container, "ctx", 4);

        for instance in &resolved[1..] {
            assert!(Arc::ptr_eq(&resolved[0], instance));
        }
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_waits_for_in_flight_construction() {
        struct Config(&'static str);

        let started = Arc::new(Barrier::new(2));
        let container = Container::new();
        let gate = Arc::clone(&started);
        container.register(
            "Config",
            Registration::factory(move |_| {
                gate.wait();
                std::thread::sleep(Duration::from_millis(50));
                Ok(Config("old"))
            }),
        );

        std::thread::scope(|s| {
            let in_flight = s.spawn(|| container.get::<Config>("Config").unwrap());
            started.wait();

            container.clear();
            container.register("Config", Registration::factory(|_| Ok(Config("new"))));
            assert_eq!(container.get::<Config>("Config").unwrap().0, "new");

            assert_eq!(in_flight.join().unwrap().0, "old");
        });

        assert_eq!(container.get::<Config>("Config").unwrap().0, "new");
    }

    #[test]
    fn test_factory_may_resolve_from_same_container() {
        let container = Container::new();
        container.instance("inner", 7u32);

        let handle = container.clone();
        container.register(
            "outer",
            Registration::factory(move |_| Ok(*handle.get::<u32>("inner")? + 1)),
        );

        assert_eq!(*container.get::<u32>("outer").unwrap(), 8);
    }
}
