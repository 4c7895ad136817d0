//! Provider traits and bootstrap registration lists
//!
//! These define what can be stored in the container, how long a resolved
//! instance lives, and how an application declares its wiring up front.

use crate::{Container, Registration};

/// Marker trait for types that can be produced by the container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {
    /// Returns the type name for debugging
    #[inline]
    fn type_name_of() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Caching policy applied to a resolved instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    /// Built on first resolve, then shared for the container's lifetime
    #[default]
    Singleton,

    /// Shared within the active scope; transient when no scope is open
    Scoped,

    /// New instance, with freshly resolved dependencies, on every resolve
    Transient,
}

impl Lifecycle {
    /// Lower-case name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Singleton => "singleton",
            Lifecycle::Scoped => "scoped",
            Lifecycle::Transient => "transient",
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a bootstrap list.
///
/// Applications usually keep a `static` slice of these and hand it to
/// [`Container::install`] once at startup.
///
/// ```rust
/// use service_container::{provider, Container, ProviderRegistration, Registration};
///
/// struct Clock;
///
/// static PROVIDERS: &[ProviderRegistration] = &[
///     provider!("Clock", Registration::factory(|_| Ok(Clock))),
/// ];
///
/// let container = Container::new();
/// container.install(PROVIDERS);
/// assert!(container.has("Clock"));
/// ```
#[derive(Clone, Copy)]
pub struct ProviderRegistration {
    /// Service key
    pub key: &'static str,
    /// Builds the registration entry
    pub build: fn() -> Registration,
}

impl ProviderRegistration {
    /// Create a bootstrap line
    #[inline]
    pub const fn new(key: &'static str, build: fn() -> Registration) -> Self {
        Self { key, build }
    }

    /// Register this line into `container`
    #[inline]
    pub fn apply(&self, container: &Container) {
        container.register(self.key, (self.build)());
    }
}

impl std::fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("key", &self.key)
            .finish()
    }
}

/// Helper macro to create a [`ProviderRegistration`]
///
/// The registration expression must not capture local variables.
#[macro_export]
macro_rules! provider {
    ($key:expr, $registration:expr) => {
        $crate::ProviderRegistration::new($key, || $registration)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock;

    #[test]
    fn test_default_lifecycle_is_singleton() {
        assert_eq!(Lifecycle::default(), Lifecycle::Singleton);
        assert_eq!(Lifecycle::Scoped.to_string(), "scoped");
    }

    #[test]
    fn test_provider_macro_registers_key() {
        let providers = [
            provider!("Clock", Registration::factory(|_| Ok(Clock))),
            provider!(
                "Later",
                Registration::factory(|_| Ok(Clock)).transient().depends_on(["Clock"])
            ),
        ];

        let container = Container::new();
        container.install(&providers);

        assert_eq!(container.keys(), vec!["Clock".to_string(), "Later".to_string()]);
        assert!(container.get::<Clock>("Later").is_ok());
    }
}
