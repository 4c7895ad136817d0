//! Ambient configuration threaded into factories
//!
//! A container owns one immutable [`Settings`] value, fixed when the container
//! is created. Factories read it through [`Dependencies::settings`]; nothing
//! else can reach it, so there is no hidden global state.
//!
//! [`Dependencies::settings`]: crate::Dependencies::settings

use crate::{DiError, Result};
use ahash::AHashMap;
use figment::providers::Env;
use std::str::FromStr;

/// String key/value configuration
///
/// # Examples
///
/// ```rust
/// use service_container::Settings;
///
/// let settings = Settings::new()
///     .set("vault_path", "/notes")
///     .set("max_tokens", "512");
///
/// assert_eq!(settings.get("vault_path"), Some("/notes"));
/// assert_eq!(settings.get_parsed::<u32>("max_tokens").unwrap(), Some(512));
/// assert_eq!(settings.get_or("model", "default"), "default");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: AHashMap<String, String>,
}

impl Settings {
    /// Empty settings
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every environment variable starting with `{prefix}_`.
    ///
    /// The prefix is stripped and the remainder lower-cased, so with prefix
    /// `VAULT` the variable `VAULT_AI_MODEL` becomes `ai_model`.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_provider(&Env::prefixed(&format!("{}_", prefix.trim_end_matches('_'))))
    }

    /// Collect the variables a figment [`Env`] provider selects, keeping its
    /// key mapping and taking values verbatim
    pub fn from_provider(env: &Env) -> Self {
        let values = env
            .iter()
            .map(|(name, value)| (name.as_str().to_ascii_lowercase(), value))
            .collect();

        Self { values }
    }

    /// Set a value, replacing any previous one
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Overlay `other` on top of `self`; values in `other` win
    pub fn merge(mut self, other: Settings) -> Self {
        self.values.extend(other.values);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[inline]
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Parse a value. A missing value is `Ok(None)`; an unparsable one is
    /// [`DiError::InvalidSetting`].
    pub fn get_parsed<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| DiError::InvalidSetting {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names of all values, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
