//! Cycle tracking for a single resolve call
//!
//! A [`ResolutionStack`] lives for exactly one top-level `resolve` and is passed
//! down the recursion by `&mut`. Entering a key returns a [`Frame`] guard that
//! pops the key when dropped, so the entry is released on success, on error and
//! while unwinding from a panicking factory.

use crate::{DiError, Result};
use std::ops::{Deref, DerefMut};

#[cfg(feature = "logging")]
use tracing::debug;

/// Keys currently under construction, outermost first
#[derive(Debug, Default)]
pub(crate) struct ResolutionStack {
    keys: Vec<String>,
}

impl ResolutionStack {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `key`, or fail if it is already being constructed further up.
    ///
    /// The reported path runs from the first occurrence of `key` back to it,
    /// e.g. `A -> B -> C -> A`.
    pub fn enter(&mut self, key: &str) -> Result<Frame<'_>> {
        if let Some(start) = self.keys.iter().position(|k| k == key) {
            let mut path = self.keys[start..].to_vec();
            path.push(key.to_string());

            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                service = key,
                cycle = %path.join(" -> "),
                "Circular dependency detected"
            );

            return Err(DiError::circular(key, path));
        }

        self.keys.push(key.to_string());
        Ok(Frame { stack: self })
    }

    #[inline]
    #[cfg_attr(not(feature = "logging"), allow(dead_code))]
    pub fn depth(&self) -> usize {
        self.keys.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One entered key; pops it from the stack on drop
pub(crate) struct Frame<'a> {
    stack: &'a mut ResolutionStack,
}

impl Deref for Frame<'_> {
    type Target = ResolutionStack;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.stack
    }
}

impl DerefMut for Frame<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stack
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.stack.keys.pop();
    }
}
