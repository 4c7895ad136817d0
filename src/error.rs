//! Error types for the service container

use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by factory closures and [`Construct`](crate::Construct) impls.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while registering, resolving or constructing services.
///
/// Every variant is a wiring or configuration bug. The container never retries
/// and never falls back to a default.
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No registration entry exists for the key
    #[error("Service not registered: {key}")]
    NotRegistered { key: String },

    /// The dependency graph loops back to a key that is still under construction
    #[error("Circular dependency detected while resolving {key}: {}", .path.join(" -> "))]
    CircularDependency { key: String, path: Vec<String> },

    /// The entry has neither a factory nor a constructor
    #[error("Invalid registration for {key}: no factory or constructor configured")]
    InvalidRegistration { key: String },

    /// The factory or constructor itself failed
    #[error("Failed to construct service {key}: {source}")]
    ConstructionFailed {
        key: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// A resolved instance is not of the requested type
    #[error("Service {key} is not of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// A manually supplied dependency list does not match the declared one
    #[error("Service {key} declares {expected} dependencies but {actual} were supplied")]
    DependencyCountMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// A factory asked for a dependency position that was never resolved
    #[error("Dependency #{index} requested but only {available} resolved")]
    MissingDependency { index: usize, available: usize },

    /// A setting exists but could not be parsed
    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },
}

impl DiError {
    /// Create a NotRegistered error
    #[inline]
    pub fn not_registered(key: impl Into<String>) -> Self {
        Self::NotRegistered { key: key.into() }
    }

    /// Create a CircularDependency error
    #[inline]
    pub fn circular(key: impl Into<String>, path: Vec<String>) -> Self {
        Self::CircularDependency {
            key: key.into(),
            path,
        }
    }

    /// Create an InvalidRegistration error
    #[inline]
    pub fn invalid_registration(key: impl Into<String>) -> Self {
        Self::InvalidRegistration { key: key.into() }
    }

    /// Wrap a factory error with the key that failed
    #[inline]
    pub fn construction_failed(key: impl Into<String>, source: BoxError) -> Self {
        Self::ConstructionFailed {
            key: key.into(),
            source: Arc::from(source),
        }
    }

    /// Create a TypeMismatch error for `T`
    #[inline]
    pub fn type_mismatch<T: 'static>(key: impl Into<String>) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// The service key this error is about, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::NotRegistered { key }
            | Self::CircularDependency { key, .. }
            | Self::InvalidRegistration { key }
            | Self::ConstructionFailed { key, .. }
            | Self::TypeMismatch { key, .. }
            | Self::DependencyCountMismatch { key, .. } => Some(key),
            Self::MissingDependency { .. } | Self::InvalidSetting { .. } => None,
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_message_shows_path() {
        let err = DiError::circular("A", vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(
            err.to_string(),
            "Circular dependency detected while resolving A: A -> B -> A"
        );
        assert_eq!(err.key(), Some("A"));
    }

    #[test]
    fn test_construction_failed_keeps_source() {
        let err = DiError::construction_failed("Repo", "disk full".into());
        assert_eq!(err.to_string(), "Failed to construct service Repo: disk full");

        let source = std::error::Error::source(&err).expect("source attached");
        assert_eq!(source.to_string(), "disk full");
    }

    #[test]
    fn test_clone_preserves_variant() {
        let err = DiError::not_registered("missing");
        let cloned = err.clone();
        assert!(matches!(cloned, DiError::NotRegistered { ref key } if key == "missing"));
    }
}
