//! Environment variable sources.
//!
//! The builder reads overrides from, and loads `.env` files into, an
//! [`Environment`]. [`ProcessEnv`] is the real process environment; a
//! `HashMap<String, String>` works as an isolated, deterministic one.

use std::collections::HashMap;

/// Key/value store the builder reads overrides from.
pub trait Environment {
    /// Current value of `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Set `key` to `value`.
    fn set(&mut self, key: &str, value: &str);

    /// Set `key` unless it already holds a non-empty value.
    ///
    /// Returns whether the value was written.
    fn set_if_empty(&mut self, key: &str, value: &str) -> bool {
        match self.get(key) {
            Some(existing) if !existing.is_empty() => false,
            _ => {
                self.set(key, value);
                true
            }
        }
    }
}

/// The process-wide environment.
///
/// Writes are visible to the whole process and are never rolled back.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        // Non-UTF-8 values read as unset
        std::env::var(key).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        // SAFETY: builds are synchronous and callers serialize builds that
        // touch the process environment.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    /// Any non-empty value counts as set, UTF-8 or not.
    fn set_if_empty(&mut self, key: &str, value: &str) -> bool {
        match std::env::var_os(key) {
            Some(existing) if !existing.is_empty() => false,
            _ => {
                self.set(key, value);
                true
            }
        }
    }
}

impl Environment for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

impl<E: Environment + ?Sized> Environment for &mut E {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn set_if_empty(&mut self, key: &str, value: &str) -> bool {
        (**self).set_if_empty(key, value)
    }
}
