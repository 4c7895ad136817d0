//! Logging setup for service-container
//!
//! The container emits `tracing` events under the `service_container` target.
//! This module installs a `tracing-subscriber` for applications that do not
//! bring their own.
//!
//! # Features
//!
//! - `logging` - Emit container events (default)
//! - `logging-json` - JSON structured output (recommended for production)
//! - `logging-pretty` - Human-readable output (recommended for development)
//!
//! Without one of the subscriber features every `init*` function is a no-op.
//!
//! # Example
//!
//! ```rust,ignore
//! use service_container::logging;
//!
//! // Default format for the enabled feature
//! logging::init();
//!
//! // Or configure explicitly
//! logging::builder()
//!     .trace()
//!     .container_only()
//!     .compact()
//!     .init();
//! ```
//!
//! When `RUST_LOG` is set it replaces the builder's level and target filter.
//! Only the first successful `init*` call installs a subscriber; later calls
//! return `false`. A call that fails because some other subscriber is already
//! the global default can be retried.

use once_cell::sync::OnceCell;
use tracing::Level;

/// Target used by every event the container emits
pub const TARGET: &str = "service_container";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    Compact,
}

/// Builder for the global subscriber
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Only show events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show container events
    pub fn container_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter directive built from level and target, e.g.
    /// `service_container=debug`
    pub fn directive(&self) -> String {
        let level = self.level.to_string().to_ascii_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the subscriber. Returns `false` if one was already installed.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) -> bool {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        static INSTALLED: OnceCell<()> = OnceCell::new();

        install_once(&INSTALLED, || {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.directive()));

            let layer = fmt::layer()
                .with_file(self.with_file)
                .with_line_number(self.with_line_number)
                .with_thread_ids(self.with_thread_ids)
                .with_target(true);

            let registry = tracing_subscriber::registry().with(filter);
            let result = match self.format {
                #[cfg(feature = "logging-json")]
                LogFormat::Json => registry.with(layer.json()).try_init(),
                // json output needs the logging-json feature
                #[cfg(not(feature = "logging-json"))]
                LogFormat::Json => registry.with(layer).try_init(),
                LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
                LogFormat::Compact => registry.with(layer.compact()).try_init(),
            };

            result.is_ok()
        })
    }

    /// No-op without a subscriber feature
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) -> bool {
        false
    }
}

/// Run `attempt` unless `cell` records an earlier success. Only a successful
/// attempt is recorded, so a failed one can be retried.
#[cfg_attr(
    not(any(feature = "logging-json", feature = "logging-pretty")),
    allow(dead_code)
)]
fn install_once(cell: &OnceCell<()>, attempt: impl FnOnce() -> bool) -> bool {
    if cell.get().is_some() {
        return false;
    }
    attempt() && cell.set(()).is_ok()
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install a subscriber in the default format for the enabled feature:
/// JSON with `logging-json`, otherwise pretty.
pub fn init() -> bool {
    if cfg!(feature = "logging-json") {
        init_json()
    } else {
        init_pretty()
    }
}

/// JSON output at DEBUG
pub fn init_json() -> bool {
    builder().json().debug().init()
}

/// Pretty output at DEBUG
pub fn init_pretty() -> bool {
    builder().pretty().debug().init()
}

/// Container events only, at DEBUG
pub fn init_container_only() -> bool {
    builder().container_only().debug().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Json);
        assert_eq!(builder.directive(), "debug");
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .trace()
            .compact()
            .with_file()
            .with_line_number()
            .container_only();

        assert_eq!(builder.format, LogFormat::Compact);
        assert!(builder.with_file);
        assert!(builder.with_line_number);
        assert_eq!(builder.directive(), "service_container=trace");
    }

    #[test]
    fn test_install_once_retries_after_failure() {
        let cell = OnceCell::new();

        // another subscriber already owns the global slot
        assert!(!install_once(&cell, || false));
        assert!(cell.get().is_none());

        assert!(install_once(&cell, || true));
        assert!(!install_once(&cell, || panic!("already installed")));
    }
}
