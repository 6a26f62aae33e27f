//! Helpers shared by unit and integration tests.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

/// Serializes tests that mutate process-wide environment variables.
pub static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Scoped environment edits, restored in reverse order on drop.
///
/// Holds [`ENV_LOCK`] for its whole lifetime, so at most one scope exists at
/// a time across the test binary.
pub struct EnvScope {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    #[must_use]
    pub fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            saved: Vec::new(),
            _lock: lock,
        }
    }

    #[must_use]
    pub fn set(mut self, key: &str, value: impl AsRef<OsStr>) -> Self {
        self.remember(key);
        // SAFETY: ENV_LOCK is held for the lifetime of the scope.
        unsafe {
            std::env::set_var(key, value);
        }
        self
    }

    #[must_use]
    pub fn set_path(self, key: &str, path: &Path) -> Self {
        self.set(key, path.as_os_str())
    }

    #[must_use]
    pub fn remove(mut self, key: &str) -> Self {
        self.remember(key);
        // SAFETY: ENV_LOCK is held for the lifetime of the scope.
        unsafe {
            std::env::remove_var(key);
        }
        self
    }

    fn remember(&mut self, key: &str) {
        if !self.saved.iter().any(|(saved, _)| saved == key) {
            self.saved.push((key.to_string(), std::env::var_os(key)));
        }
    }
}

impl Default for EnvScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (key, original) in self.saved.drain(..).rev() {
            // SAFETY: ENV_LOCK is still held; `_lock` drops after this body.
            unsafe {
                match original {
                    Some(value) => std::env::set_var(&key, value),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }
}

/// Render a filesystem path so it can be embedded inside TOML without
/// triggering escape sequences on Windows.
#[must_use]
pub fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}
