//! Module of MemStorage and the partitioned ObjectStore

pub mod memory;
mod store;

use async_trait::async_trait;

use crate::error::Result;
pub use crate::storage::memory::MemStorage;
pub use crate::storage::store::ObjectStore;

/// Key value storage interface
#[async_trait]
pub trait KvStorageInterface<V> {
    /// Get a cache entry by `key`.
    async fn get(&self, key: &str) -> Result<Option<V>>;

    /// Put `entry` in the cache under `key`.
    async fn put(&self, key: &str, value: &V) -> Result<()>;

    async fn get_all(&self) -> Result<Vec<(String, V)>>;

    /// Remove an `entry` by `key`, returning it.
    async fn remove(&self, key: &str) -> Result<Option<V>>;

    /// Get the current storage usage.
    async fn count(&self) -> Result<u32>;
}
