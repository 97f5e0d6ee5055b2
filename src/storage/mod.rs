//! Key-value persistence behind the history store and the recent-devices cache.
//!
//! Both stores share one injected [`KeyValueStore`] and keep a whole collection
//! under a single key, rewriting it in full on every change.

mod file;
mod memory;

use std::io;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::PersistenceError;

pub use file::FileStore;
pub use memory::MemoryStore;

pub const HISTORY_KEY: &str = "deviceHistory";
pub const RECENT_KEY: &str = "recentDevices";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> io::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> io::Result<()>;
}

pub(crate) async fn read_blob(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<String>, PersistenceError> {
    store
        .get(key)
        .await
        .map_err(|source| PersistenceError::Read {
            key: key.to_string(),
            source,
        })
}

pub(crate) async fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Encode {
        key: key.to_string(),
        source,
    })?;
    store
        .set(key, &text)
        .await
        .map_err(|source| PersistenceError::Write {
            key: key.to_string(),
            source,
        })
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    key: &str,
    content: &str,
) -> Result<T, PersistenceError> {
    serde_json::from_str::<T>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        PersistenceError::decode(key, format!("invalid JSON at line {line}, column {column}: {err}"))
    })
}
