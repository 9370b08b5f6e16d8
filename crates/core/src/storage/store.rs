use std::collections::HashMap;

use super::KvStorageInterface;
use super::MemStorage;
use crate::dht::did::hash_of;
use crate::dht::Did;
use crate::error::Result;

/// Storage backend accepted by [ObjectStore::new_with_storage].
pub type ValueStorage = Box<dyn KvStorageInterface<String> + Send + Sync>;

/// Key/value pairs held by one node.
///
/// The store is expected to only hold keys whose id falls in the node's partition
/// `(predecessor, self]`, but it does not enforce that: a misplaced key is reported by
/// [ObjectStore::check_placement] and stays where it is. Keys move between nodes through
/// [ObjectStore::export_range] only.
pub struct ObjectStore {
    storage: ValueStorage,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::new_with_storage(Box::new(MemStorage::<String>::new()))
    }

    pub fn new_with_storage(storage: ValueStorage) -> Self {
        Self { storage }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get(key).await
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.storage.put(key, &value.to_string()).await
    }

    pub async fn count(&self) -> Result<u32> {
        self.storage.count().await
    }

    pub async fn list(&self) -> Result<Vec<(String, String)>> {
        self.storage.get_all().await
    }

    /// Remove and return every pair whose key id lies in `(lower, upper]`.
    ///
    /// Not atomic with respect to the importer: a pair is gone from here once returned.
    pub async fn export_range(&self, lower: Did, upper: Did) -> Result<HashMap<String, String>> {
        let mut exported = HashMap::new();
        for (key, _) in self.storage.get_all().await? {
            if !hash_of(&key).in_right_closed(lower, upper) {
                continue;
            }
            if let Some(value) = self.storage.remove(&key).await? {
                exported.insert(key, value);
            }
        }
        tracing::debug!(
            "exported {} keys in ({}, {}]",
            exported.len(),
            lower,
            upper
        );
        Ok(exported)
    }

    /// Remove and return everything listed at the time of the call. A pair written
    /// meanwhile stays in the store.
    pub async fn drain(&self) -> Result<HashMap<String, String>> {
        let mut drained = HashMap::new();
        for (key, _) in self.storage.get_all().await? {
            if let Some(value) = self.storage.remove(&key).await? {
                drained.insert(key, value);
            }
        }
        Ok(drained)
    }

    /// Log a warning if `key` does not belong to `(predecessor, owner]`.
    pub fn check_placement(&self, key: &str, predecessor: Did, owner: Did) -> bool {
        if predecessor == owner {
            return true;
        }
        let id = hash_of(key);
        let placed = id.in_right_closed(predecessor, owner);
        if !placed {
            tracing::warn!(
                "key {} ({}) should not be located at {}, partition is ({}, {}]",
                key,
                id,
                owner,
                predecessor,
                owner
            );
        }
        placed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;

    /// Writes `late` right after the first listing, as a concurrent put would.
    struct LateWriter {
        inner: Arc<MemStorage<String>>,
        late: std::sync::Mutex<Option<(String, String)>>,
    }

    #[async_trait]
    impl KvStorageInterface<String> for LateWriter {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: &String) -> Result<()> {
            self.inner.put(key, value).await
        }

        async fn get_all(&self) -> Result<Vec<(String, String)>> {
            let all = self.inner.get_all().await?;
            let late = self.late.lock().unwrap().take();
            if let Some((key, value)) = late {
                self.inner.put(&key, &value).await?;
            }
            Ok(all)
        }

        async fn remove(&self, key: &str) -> Result<Option<String>> {
            self.inner.remove(key).await
        }

        async fn count(&self) -> Result<u32> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_drain_keeps_concurrent_write() -> Result<()> {
        let inner = Arc::new(MemStorage::<String>::new());
        let store = ObjectStore::new_with_storage(Box::new(LateWriter {
            inner: inner.clone(),
            late: std::sync::Mutex::new(Some(("late".to_string(), "v2".to_string()))),
        }));
        store.put("early", "v1").await?;

        let drained = store.drain().await?;
        assert_eq!(drained.len(), 1);
        assert_eq!(drained["early"], "v1");
        assert_eq!(inner.get("late").await?, Some("v2".to_string()));
        assert_eq!(store.count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_export_range() -> Result<()> {
        let store = ObjectStore::new();
        let keys: Vec<String> = (0..20).map(|i| format!("key-{i}")).collect();
        for k in keys.iter() {
            store.put(k, &format!("value of {k}")).await?;
        }

        let lower = hash_of("key-3");
        let upper = hash_of("key-7");
        let expected: Vec<&String> = keys
            .iter()
            .filter(|k| hash_of(k).in_right_closed(lower, upper))
            .collect();

        let exported = store.export_range(lower, upper).await?;
        assert_eq!(exported.len(), expected.len());
        assert!(exported.contains_key("key-7"));
        assert!(!exported.contains_key("key-3"));
        assert_eq!(exported["key-7"], "value of key-7");
        assert_eq!(store.count().await? as usize, keys.len() - expected.len());
        assert_eq!(store.get("key-7").await?, None);

        let rest = store.drain().await?;
        assert_eq!(rest.len(), keys.len() - expected.len());
        assert_eq!(store.count().await?, 0);
        Ok(())
    }

    #[test]
    fn test_check_placement() {
        let store = ObjectStore::new();
        let id = hash_of("apple");
        assert!(store.check_placement("apple", id - Did::from(1u32), id));
        assert!(!store.check_placement("apple", id, id + Did::from(1u32)));
        assert!(store.check_placement("apple", id, id));
    }
}
