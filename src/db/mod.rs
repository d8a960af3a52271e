//! Persistent key-value store.
//!
//! Every document (user list, station list, current session) is stored as a
//! JSON string under a fixed key. Backends only move raw strings around;
//! [`Store`] owns (de)serialization and serializes read-modify-write cycles
//! so that a booking and a simulation tick never lose each other's writes.

mod file;
mod memory;
mod models;
mod seeders;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use models::*;
pub use seeders::{seed_demo_data, SeedStats};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{StoreBackend, StoreConfig};

/// Key holding the registered user list
pub const USERS_KEY: &str = "ev_users";
/// Key holding the station list
pub const STATIONS_KEY: &str = "ev_stations";
/// Key holding the current session (or `null`)
pub const SESSION_KEY: &str = "ev_session";

/// Errors raised by the store and its backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access '{key}' in store: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored value for '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw string storage backend
pub trait KeyValueStore: Send + Sync {
    /// Get the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the raw value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key` if present
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed JSON document store shared by every component
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn KeyValueStore>,
    update_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            update_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a store backed by process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Read and deserialize the document under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent (or holds an empty string)
    /// and `Err(StoreError::Corrupt)` when the stored text is not a valid
    /// `T`.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let raw = match self.backend.get(key)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(None),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    /// Read the document under `key`, collapsing absent and corrupt values
    /// (and backend failures) to `fallback`
    pub fn read_or<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        match self.read(key) {
            Ok(Some(value)) => value,
            Ok(None) => fallback,
            Err(e) => {
                warn!(key = key, error = %e, "Discarding unreadable stored value");
                fallback
            }
        }
    }

    /// Serialize `value` and replace whatever is stored under `key`
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, &raw)
    }

    /// Remove the document under `key`
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.backend.remove(key)
    }

    /// Read-modify-write the document under `key`.
    ///
    /// The document is re-read inside the update lock, so `f` always sees
    /// the latest persisted state. The result is written back only when `f`
    /// succeeds; an error leaves the stored document untouched.
    pub fn update<T, R, E, F>(&self, key: &str, fallback: T, f: F) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
        F: FnOnce(&mut T) -> Result<R, E>,
    {
        let _guard = self.update_lock.lock();
        let mut document = self.read_or(key, fallback);
        let result = f(&mut document)?;
        self.write(key, &document)?;
        Ok(result)
    }

    /// Read-modify-write that only persists when `f` reports a change
    pub fn update_if_changed<T, F>(&self, key: &str, fallback: T, f: F) -> Result<bool, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> bool,
    {
        let _guard = self.update_lock.lock();
        let mut document = self.read_or(key, fallback);
        let changed = f(&mut document);
        if changed {
            self.write(key, &document)?;
        }
        Ok(changed)
    }
}

/// Open the store described by the configuration
pub fn init(config: &StoreConfig) -> Result<Store> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store, state will not survive restarts");
            Ok(Store::in_memory())
        }
        StoreBackend::File => {
            crate::utils::ensure_dir(&config.data_dir)?;
            let backend = FileStore::open(&config.data_dir).with_context(|| {
                format!("Failed to open store at {}", config.data_dir.display())
            })?;
            info!("Store initialized at {}", config.data_dir.display());
            Ok(Store::new(Arc::new(backend)))
        }
    }
}
