//! Key/value access: resolve the owner, then serve locally or forward once.
use std::collections::HashMap;

use super::ChordNode;
use crate::dht::did::hash_of;
use crate::dht::Did;
use crate::error::Error;
use crate::error::Result;

impl ChordNode {
    /// Read `key` from whichever node owns it.
    pub async fn get(&self, key: &str) -> Result<String> {
        let owner = self.find_successor(hash_of(key)).await?;
        if owner == *self.node() {
            self.get_local(key).await
        } else {
            tracing::debug!("forward get {} to {}", key, owner);
            self.link.get_remote(&owner, key).await
        }
    }

    /// Write `key` on whichever node owns it.
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        let owner = self.find_successor(hash_of(key)).await?;
        if owner == *self.node() {
            self.put_local(key, value).await
        } else {
            tracing::debug!("forward put {} to {}", key, owner);
            self.link.put_remote(&owner, key, value).await
        }
    }

    /// Read from the local store only.
    pub async fn get_local(&self, key: &str) -> Result<String> {
        self.store
            .get(key)
            .await?
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Write to the local store only. A key outside our partition is stored anyway and
    /// logged.
    pub async fn put_local(&self, key: &str, value: &str) -> Result<()> {
        if !self.ring.is_alone()? {
            let pred = self.ring.predecessor()?;
            self.store.check_placement(key, pred.did, self.did());
        }
        self.store.put(key, value).await
    }

    /// Hand over the local pairs with ids in `(lower, upper]`.
    pub async fn export_keys(&self, lower: Did, upper: Did) -> Result<HashMap<String, String>> {
        self.store.export_range(lower, upper).await
    }
}
