use crate::error::AppError;
use log::warn;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Persistence port: a JSON key-value store in the shape of the extension's
/// local storage. Values are JSON documents.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Write all entries or none of them.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AppError>;

    fn remove(&self, keys: &[&str]) -> Result<(), AppError>;
}

/// Read and decode one key. A value that does not decode is logged and
/// treated as absent; read failures still propagate.
pub fn load<T: DeserializeOwned>(storage: &impl Storage, key: &str) -> Result<Option<T>, AppError> {
    Ok(storage.get(key)?.and_then(|raw| {
        serde_json::from_str(&raw)
            .map_err(|e| warn!("Ignoring unreadable {key}: {e}"))
            .ok()
    }))
}

/// In-process storage. Clones share the same map. Writes can be made to
/// fail to exercise the last-known-good paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("writes are disabled".into()));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let values = self.values.lock().map_err(|_| AppError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AppError> {
        self.check_writable()?;
        let mut values = self.values.lock().map_err(|_| AppError::LockPoisoned)?;
        for (key, value) in entries {
            values.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<(), AppError> {
        self.check_writable()?;
        let mut values = self.values.lock().map_err(|_| AppError::LockPoisoned)?;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}
