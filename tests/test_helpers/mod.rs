//! Process environment helpers shared by integration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Applies environment overrides and restores the previous values on drop.
///
/// Holding a guard serializes every other environment change made through
/// this type.
pub struct EnvVarGuard {
    restore: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Sets each `(key, value)` pair; `None` removes the variable.
    pub fn set_many(overrides: &[(OsString, Option<OsString>)]) -> Self {
        let lock = ENV_MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let restore = overrides
            .iter()
            .map(|(key, value)| {
                let previous = env::var_os(key);
                apply(key, value.as_ref());
                (key.clone(), previous)
            })
            .collect();
        Self {
            restore,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, previous) in self.restore.drain(..).rev() {
            apply(&key, previous.as_ref());
        }
    }
}

fn apply(key: &OsString, value: Option<&OsString>) {
    // SAFETY: ENV_MUTEX is held by the caller's guard for every mutation.
    unsafe {
        match value {
            Some(set) => env::set_var(key, set),
            None => env::remove_var(key),
        }
    }
}
