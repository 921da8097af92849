use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalStoreError {
    #[error("Failed to read {key}: {message}")]
    Read { key: String, message: String },

    #[error("Failed to write {key}: {message}")]
    Write { key: String, message: String },

    #[error("Invalid value under {key}: {message}")]
    InvalidFormat { key: String, message: String },
}

pub type LocalStoreResult<T> = Result<T, LocalStoreError>;

/// Durable per-user key/value storage. Each key holds one JSON document and
/// is owned by exactly one component; reads and writes are synchronous.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> LocalStoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> LocalStoreResult<()>;
}

pub fn load_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> LocalStoreResult<Option<T>> {
    match store.get(key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| LocalStoreError::InvalidFormat {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &dyn LocalStore, key: &str, value: &T) -> LocalStoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|e| LocalStoreError::Write {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, &raw)
}
