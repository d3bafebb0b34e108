//! Process environment helpers shared by tests that touch `PRENOTA_*` variables

use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that read or write the process environment
pub fn lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Restores every touched variable on drop
pub struct EnvGuard {
    vars_to_restore: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub fn new() -> Self {
        Self {
            vars_to_restore: Vec::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars_to_restore
            .push((key.to_string(), std::env::var(key).ok()));
        unsafe {
            std::env::set_var(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.vars_to_restore
            .push((key.to_string(), std::env::var(key).ok()));
        unsafe {
            std::env::remove_var(key);
        }
    }

    /// Clears the loader's own variables so the host environment cannot leak in
    pub fn clear_loader_vars(&mut self) {
        for key in ["PRENOTA_CONFIG_DIR", "PRENOTA_CONFIG_FILE", "PRENOTA_APP_ENV"] {
            self.remove(key);
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // Reverse order so a key touched twice ends at its first saved value
        for (key, original_value) in self.vars_to_restore.iter().rev() {
            unsafe {
                match original_value {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}
