//! # service-container - keyed service composition for Rust
//!
//! A container that wires together a graph of named services, resolves their
//! dependencies recursively, applies lifecycle caching and rejects circular
//! dependency graphs with a readable path instead of overflowing the stack.
//!
//! ## Features
//!
//! - 🔑 **String keys** - Services live in one flat namespace of names
//! - 🕸️ **Dependency graphs** - Each entry lists the keys it needs, resolved in order
//! - ♻️ **Lifecycles** - Singleton, scoped and transient
//! - 🔁 **Cycle detection** - `A -> B -> C -> A` is reported, never recursed into
//! - 🧪 **Test friendly** - `clear()` and re-register fakes, or build one unit
//!   from hand-picked dependencies with [`ServiceFactory::create_with`]
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use service_container::{Container, Registration};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! struct Repo {
//!     logger: Arc<Logger>,
//! }
//!
//! struct NoteService {
//!     repo: Arc<Repo>,
//!     logger: Arc<Logger>,
//! }
//!
//! let container = Container::new();
//!
//! container.register("Logger", Registration::factory(|_| Ok(Logger)));
//! container.register(
//!     "Repo",
//!     Registration::factory(|deps| Ok(Repo { logger: deps.get(0)? })).depends_on(["Logger"]),
//! );
//! container.register(
//!     "NoteService",
//!     Registration::factory(|deps| {
//!         Ok(NoteService {
//!             repo: deps.get(0)?,
//!             logger: deps.get(1)?,
//!         })
//!     })
//!     .transient()
//!     .depends_on(["Repo", "Logger"]),
//! );
//!
//! let a = container.get::<NoteService>("NoteService").unwrap();
//! let b = container.get::<NoteService>("NoteService").unwrap();
//!
//! // new service each time, shared singletons underneath
//! assert!(!Arc::ptr_eq(&a, &b));
//! assert!(Arc::ptr_eq(&a.repo, &b.repo));
//! assert!(Arc::ptr_eq(&a.logger, &b.repo.logger));
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use service_container::{Container, Registration};
//! use std::sync::Arc;
//!
//! struct RequestContext;
//!
//! let container = Container::new();
//! container.register("ctx", Registration::factory(|_| Ok(RequestContext)).scoped());
//!
//! container.begin_scope("request-1");
//! let a = container.get::<RequestContext>("ctx").unwrap();
//! assert!(Arc::ptr_eq(&a, &container.get::<RequestContext>("ctx").unwrap()));
//! container.end_scope();
//!
//! container.begin_scope("request-2");
//! let b = container.get::<RequestContext>("ctx").unwrap();
//! assert!(!Arc::ptr_eq(&a, &b));
//! ```
//!
//! ## Cycles
//!
//! ```rust
//! use service_container::{Container, DiError, Registration};
//!
//! struct Node;
//!
//! let container = Container::new();
//! container.register("X", Registration::factory(|_| Ok(Node)).depends_on(["Y"]));
//! container.register("Y", Registration::factory(|_| Ok(Node)).depends_on(["X"]));
//!
//! let err = container.resolve("X").unwrap_err();
//! assert!(matches!(err, DiError::CircularDependency { .. }));
//! assert_eq!(
//!     err.to_string(),
//!     "Circular dependency detected while resolving X: X -> Y -> X"
//! );
//! ```

mod container;
mod error;
mod factory;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod resolver;
mod scope;
mod service_factory;
mod settings;
mod storage;

pub use container::*;
pub use error::*;
pub use factory::{Construct, Dependencies, Instance, Registration};
pub use provider::*;
pub use scope::{ScopeGuard, ScopeId};
pub use service_factory::*;
pub use settings::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BoxError, Construct, Container, Dependencies, DiError, Injectable, Instance, Lifecycle,
        ProviderRegistration, Registration, Result, ScopeGuard, ScopeId, ServiceFactory, Settings,
    };
    pub use std::sync::Arc;
}
