//! Factory facade over the container
//!
//! [`ServiceFactory`] forwards resolution to a [`Container`] and adds one
//! thing the container deliberately lacks: building an entry from a
//! hand-picked dependency list, without walking the graph or touching any
//! cache. Tests use it to construct a unit with fakes.

use crate::factory::{Dependencies, Instance};
use crate::settings::Settings;
use crate::{Container, DiError, Injectable, Result};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// Convenience wrapper around a [`Container`].
///
/// # Examples
///
/// ```rust
/// use service_container::{Container, Instance, Registration, ServiceFactory};
/// use std::sync::Arc;
///
/// struct Store(&'static str);
/// struct Indexer { store: Arc<Store> }
///
/// let container = Container::new();
/// container.register("Store", Registration::factory(|_| Ok(Store("disk"))));
/// container.register(
///     "Indexer",
///     Registration::factory(|deps| Ok(Indexer { store: deps.get(0)? })).depends_on(["Store"]),
/// );
///
/// let factory = ServiceFactory::new(container);
///
/// // normal resolution
/// assert_eq!(factory.get::<Indexer>("Indexer").unwrap().store.0, "disk");
///
/// // hand-picked fake, graph bypassed
/// let indexer = factory
///     .create_with_as::<Indexer>("Indexer", vec![Arc::new(Store("memory")) as Instance])
///     .unwrap();
/// assert_eq!(indexer.store.0, "memory");
/// ```
#[derive(Clone, Debug)]
pub struct ServiceFactory {
    container: Container,
}

impl ServiceFactory {
    /// Wrap an existing container
    #[inline]
    pub fn new(container: Container) -> Self {
        Self { container }
    }

    /// Wrap a fresh container carrying `settings`
    #[inline]
    pub fn with_settings(settings: Settings) -> Self {
        Self::new(Container::with_settings(settings))
    }

    /// The wrapped container
    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Ambient configuration threaded into factories
    #[inline]
    pub fn settings(&self) -> &Settings {
        self.container.settings()
    }

    /// Forward to [`Container::resolve`]
    #[inline]
    pub fn resolve(&self, key: &str) -> Result<Instance> {
        self.container.resolve(key)
    }

    /// Forward to [`Container::get`]
    #[inline]
    pub fn get<T: Injectable>(&self, key: &str) -> Result<Arc<T>> {
        self.container.get::<T>(key)
    }

    /// Build the entry for `key` from `instances` instead of resolving its
    /// dependencies.
    ///
    /// `instances` must line up with the declared dependency list. The result
    /// is never cached, whatever the entry's lifecycle.
    pub fn create_with(&self, key: &str, instances: Vec<Instance>) -> Result<Instance> {
        let registration = self
            .container
            .registration(key)
            .ok_or_else(|| DiError::not_registered(key))?;

        let declared = registration.dependencies();
        if declared.len() != instances.len() {
            return Err(DiError::DependencyCountMismatch {
                key: key.to_string(),
                expected: declared.len(),
                actual: instances.len(),
            });
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            service = key,
            dependencies = instances.len(),
            "Constructing service from supplied dependencies"
        );

        let resolved = declared.iter().cloned().zip(instances).collect();
        let deps = Dependencies::new(resolved, self.container.shared_settings());
        registration.build(key, &deps)
    }

    /// [`ServiceFactory::create_with`] followed by a downcast to `T`
    pub fn create_with_as<T: Injectable>(
        &self,
        key: &str,
        instances: Vec<Instance>,
    ) -> Result<Arc<T>> {
        self.create_with(key, instances)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(key))
    }
}

impl From<Container> for ServiceFactory {
    fn from(container: Container) -> Self {
        Self::new(container)
    }
}
