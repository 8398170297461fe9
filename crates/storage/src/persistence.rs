use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::store::{KeyValueStore, StorageError};

pub const SETTINGS_KEY: &str = "tf_settings";
pub const SIGNALS_KEY: &str = "tf_signals";

/// Typed JSON access on top of a `KeyValueStore`.
///
/// Missing or unreadable values are never an error for the caller: `load`
/// hands back the fallback and `save` logs failures.
#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        match self.try_load(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("No stored value for {}, using default", key);
                fallback
            }
            Err(e) => {
                warn!("Stored value for {} unusable ({}), using default", key, e);
                fallback
            }
        }
    }

    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_save(key, value).await {
            error!("Failed to persist {}: {}", key, e);
        }
    }

    async fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn try_save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.store.put_raw(key, &raw).await
    }
}
