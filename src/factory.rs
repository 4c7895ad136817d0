//! Registration entries and the factories behind them
//!
//! A [`Registration`] describes how one service key is built: an explicit
//! factory closure or a [`Construct`] type, a [`Lifecycle`], and the ordered
//! list of keys it depends on. Both construction paths are type-erased into the
//! same [`FactoryFn`] shape so the resolver never needs to know `T`.

use crate::settings::Settings;
use crate::{BoxError, DiError, Injectable, Lifecycle, Result};
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// A type-erased, shareable service instance
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased construction function
pub(crate) type FactoryFn =
    Arc<dyn Fn(&Dependencies) -> std::result::Result<Instance, BoxError> + Send + Sync>;

/// Erase a construction closure into the shared [`FactoryFn`] shape
fn erase<F>(build: F) -> FactoryFn
where
    F: Fn(&Dependencies) -> std::result::Result<Instance, BoxError> + Send + Sync + 'static,
{
    Arc::new(build)
}

/// A type the container can build from its resolved dependencies.
///
/// This is the "constructor" path of a registration. An explicit factory
/// closure on the same entry takes precedence over it.
///
/// ```rust
/// use service_container::{BoxError, Construct, Container, Dependencies, Registration};
/// use std::sync::Arc;
///
/// struct Logger;
///
/// struct Repo {
///     logger: Arc<Logger>,
/// }
///
/// impl Construct for Repo {
///     fn construct(deps: &Dependencies) -> Result<Self, BoxError> {
///         Ok(Repo { logger: deps.get(0)? })
///     }
/// }
///
/// let container = Container::new();
/// container.register("Logger", Registration::factory(|_| Ok(Logger)));
/// container.register("Repo", Registration::constructor::<Repo>().depends_on(["Logger"]));
///
/// let repo = container.get::<Repo>("Repo").unwrap();
/// let logger = container.get::<Logger>("Logger").unwrap();
/// assert!(Arc::ptr_eq(&repo.logger, &logger));
/// ```
pub trait Construct: Injectable + Sized {
    /// Build an instance from dependencies resolved in declaration order
    fn construct(deps: &Dependencies) -> std::result::Result<Self, BoxError>;
}

/// Constructor path of an entry, remembered with its type name for logging
#[derive(Clone)]
struct Constructor {
    build: FactoryFn,
    type_name: &'static str,
}

/// Resolved dependencies handed to a factory or constructor.
///
/// Instances are kept in the order the registration declared them, paired
/// with the key they were resolved from.
pub struct Dependencies {
    resolved: Vec<(String, Instance)>,
    settings: Arc<Settings>,
}

impl Dependencies {
    pub(crate) fn new(resolved: Vec<(String, Instance)>, settings: Arc<Settings>) -> Self {
        Self { resolved, settings }
    }

    /// Typed dependency at `index` (declaration order)
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>> {
        let (key, instance) = self.resolved.get(index).ok_or(DiError::MissingDependency {
            index,
            available: self.resolved.len(),
        })?;

        Arc::clone(instance)
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(key.as_str()))
    }

    /// Typed dependency by the key it was declared under
    pub fn by_key<T: Injectable>(&self, key: &str) -> Result<Arc<T>> {
        let instance = self
            .resolved
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, instance)| Arc::clone(instance))
            .ok_or_else(|| DiError::not_registered(key))?;

        instance
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(key))
    }

    /// Untyped dependency at `index`
    #[inline]
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.resolved.get(index).map(|(_, instance)| instance)
    }

    /// Keys in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resolved.iter().map(|(key, _)| key.as_str())
    }

    /// Ambient configuration of the owning container
    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Stored description of one service key.
///
/// Built fluently and handed to [`Container::register`](crate::Container::register):
///
/// ```rust
/// use service_container::{Lifecycle, Registration};
///
/// struct Service;
///
/// let registration = Registration::factory(|_| Ok(Service))
///     .transient()
///     .depends_on(["Repo", "Logger"]);
///
/// assert_eq!(registration.lifecycle(), Lifecycle::Transient);
/// assert_eq!(registration.dependencies(), ["Repo", "Logger"]);
/// ```
#[derive(Clone, Default)]
pub struct Registration {
    factory: Option<FactoryFn>,
    constructor: Option<Constructor>,
    lifecycle: Lifecycle,
    dependencies: Vec<String>,
}

impl Registration {
    /// An entry with no construction path yet; resolving it fails with
    /// [`DiError::InvalidRegistration`] until one is attached.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry built by a factory closure
    #[inline]
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Injectable,
        F: Fn(&Dependencies) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::new().with_factory(factory)
    }

    /// Entry built by `T::construct`
    #[inline]
    pub fn constructor<T: Construct>() -> Self {
        Self::new().with_constructor::<T>()
    }

    /// Entry that always yields the given value.
    ///
    /// Every lifecycle hands out the same `Arc`, so this is effectively an
    /// eager singleton.
    pub fn instance<T: Injectable>(value: T) -> Self {
        let instance: Instance = Arc::new(value);
        Self {
            factory: Some(erase(move |_| Ok(Arc::clone(&instance)))),
            ..Self::default()
        }
    }

    /// Attach (or replace) the factory closure
    pub fn with_factory<T, F>(mut self, factory: F) -> Self
    where
        T: Injectable,
        F: Fn(&Dependencies) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.factory = Some(erase(move |deps| {
            factory(deps).map(|value| Arc::new(value) as Instance)
        }));
        self
    }

    /// Attach (or replace) the constructor type
    pub fn with_constructor<T: Construct>(mut self) -> Self {
        self.constructor = Some(Constructor {
            build: erase(|deps| T::construct(deps).map(|value| Arc::new(value) as Instance)),
            type_name: std::any::type_name::<T>(),
        });
        self
    }

    /// Set the lifecycle
    #[inline]
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    #[inline]
    pub fn singleton(self) -> Self {
        self.with_lifecycle(Lifecycle::Singleton)
    }

    #[inline]
    pub fn scoped(self) -> Self {
        self.with_lifecycle(Lifecycle::Scoped)
    }

    #[inline]
    pub fn transient(self) -> Self {
        self.with_lifecycle(Lifecycle::Transient)
    }

    /// Append dependency keys, resolved in the order given
    pub fn depends_on<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(keys.into_iter().map(Into::into));
        self
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[inline]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    #[inline]
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    #[inline]
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Run the construction path. The factory wins over the constructor.
    pub(crate) fn build(&self, key: &str, deps: &Dependencies) -> Result<Instance> {
        let build = match (&self.factory, &self.constructor) {
            (Some(factory), _) => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "service_container",
                    service = key,
                    path = "factory",
                    "Invoking factory"
                );
                factory
            }
            (None, Some(constructor)) => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "service_container",
                    service = key,
                    path = "constructor",
                    type_name = constructor.type_name,
                    "Invoking constructor"
                );
                &constructor.build
            }
            (None, None) => return Err(DiError::invalid_registration(key)),
        };

        build(deps).map_err(|source| DiError::construction_failed(key, source))
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("lifecycle", &self.lifecycle)
            .field("dependencies", &self.dependencies)
            .field("factory", &self.factory.is_some())
            .field("constructor", &self.constructor.as_ref().map(|c| c.type_name))
            .finish()
    }
}
