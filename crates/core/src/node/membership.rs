//! Joining, leaving and the neighbor updates other nodes push to us.
use rand::seq::SliceRandom;

use super::ChordNode;
use crate::dht::Did;
use crate::dht::RemoteNode;
use crate::error::Result;

impl ChordNode {
    /// Join the ring through the directory.
    ///
    /// Registers, then tries the listed members in random order as contact. A node that is
    /// the only member, or that cannot reach any member, starts a ring of one.
    /// The caller starts the stabilizer afterwards.
    pub async fn join(&self) -> Result<()> {
        let directory = match &self.directory {
            Some(d) => d.clone(),
            None => return self.ring.init_alone(),
        };
        let address = self.node().address.clone();
        directory.register(&address).await?;

        let mut members: Vec<String> = directory
            .list_members()
            .await?
            .into_iter()
            .filter(|m| *m != address)
            .collect();
        members.shuffle(&mut rand::thread_rng());

        if members.is_empty() {
            tracing::info!("{} is the first member of the ring", self.node());
            return self.ring.init_alone();
        }

        for member in members {
            let contact = RemoteNode::new(&member);
            match self.join_via(&contact).await {
                Ok(()) => return Ok(()),
                Err(e) => tracing::warn!("failed to join via {}: {}", member, e),
            }
        }
        tracing::warn!("no member answered, {} starts alone", self.node());
        self.ring.init_alone()
    }

    /// Join the ring through an explicit contact.
    pub async fn join_via(&self, contact: &RemoteNode) -> Result<()> {
        let mut successor = self.link.find_successor(contact, self.did()).await?;
        if successor == *self.node() {
            successor = contact.clone();
        }
        tracing::info!("{} joined via {}, successor {}", self.node(), contact, successor);
        self.ring.set_successor(successor.clone())?;
        self.ring.set_predecessor(self.node().clone())?;
        self.pull_keys(&successor).await;

        if self.ring.config.announce_on_join {
            self.announce().await;
        }
        Ok(())
    }

    /// Take over the pairs the new successor held for our partition.
    pub(crate) async fn pull_keys(&self, successor: &RemoteNode) {
        if successor == self.node() {
            return;
        }
        match self
            .link
            .get_keys_in_interval(successor, successor.did, self.did())
            .await
        {
            Ok(pairs) => {
                if !pairs.is_empty() {
                    tracing::info!("pulled {} keys from {}", pairs.len(), successor);
                }
                for (key, value) in pairs {
                    if let Err(e) = self.store.put(&key, &value).await {
                        tracing::error!("failed to store pulled key {}: {}", key, e);
                    }
                }
            }
            Err(e) => tracing::warn!("failed to pull keys from {}: {}", successor, e),
        }
    }

    /// Offer ourselves to the fingers of the nodes that should point at us.
    async fn announce(&self) {
        for index in 0..Did::BITS {
            let target = self.did().predecessor_offset(index) + Did::from(1u32);
            let node = match self.find_predecessor(target).await {
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!("announce slot {} failed: {}", index, e);
                    continue;
                }
            };
            if node == *self.node() {
                continue;
            }
            if let Err(e) = self
                .link
                .update_finger_table(&node, self.node(), index)
                .await
            {
                tracing::debug!("announce slot {} to {} failed: {}", index, node, e);
            }
        }
    }

    /// `candidate` thinks it might be our predecessor.
    pub async fn notify(&self, candidate: RemoteNode) -> Result<()> {
        let dead = match self.ring.notify_probe(&candidate)? {
            Some(pred) => {
                if self.link.is_alive(&pred).await {
                    None
                } else {
                    Some(pred)
                }
            }
            None => None,
        };
        if self.ring.notify(candidate.clone(), dead.as_ref())? {
            tracing::info!("{} new predecessor {}", self.node().did, candidate);
        }
        Ok(())
    }

    /// Forced predecessor update, sent by a leaving predecessor.
    pub fn update_predecessor(&self, node: RemoteNode) -> Result<()> {
        self.ring.set_predecessor(node)
    }

    /// Forced successor update, sent by a leaving successor.
    pub fn update_successor(&self, node: RemoteNode) -> Result<()> {
        self.ring.set_successor(node)
    }

    /// `node` may be a better entry for finger slot `index`. An accepted update is passed on
    /// to our predecessor, whose slot may need it too.
    pub async fn update_finger_table(&self, node: RemoteNode, index: usize) -> Result<()> {
        if !self.ring.update_finger(index, node.clone())? {
            return Ok(());
        }
        let pred = self.ring.predecessor()?;
        if pred == *self.node() || pred == node {
            return Ok(());
        }
        if let Err(e) = self.link.update_finger_table(&pred, &node, index).await {
            tracing::debug!("failed to forward finger update to {}: {}", pred, e);
        }
        Ok(())
    }

    /// Leave the ring, best-effort: unregister, hand our neighbors to each other, move our
    /// pairs to the successor and stop.
    pub async fn leave(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        tracing::info!("{} is leaving the ring", self.node());
        if let Some(directory) = &self.directory {
            if let Err(e) = directory.unregister(&self.node().address).await {
                tracing::warn!("failed to unregister: {}", e);
            }
        }

        let me = self.node().clone();
        let successor = self.ring.successor()?;
        let predecessor = self.ring.predecessor()?;
        if successor != me {
            let new_pred = if predecessor == me {
                successor.clone()
            } else {
                predecessor.clone()
            };
            if let Err(e) = self.link.update_predecessor(&successor, &new_pred).await {
                tracing::warn!("failed to update predecessor of {}: {}", successor, e);
            }
            if predecessor != me {
                if let Err(e) = self.link.update_successor(&predecessor, &successor).await {
                    tracing::warn!("failed to update successor of {}: {}", predecessor, e);
                }
            }
            for (key, value) in self.store.drain().await? {
                if let Err(e) = self.link.put_remote(&successor, &key, &value).await {
                    tracing::warn!("failed to hand off {} to {}: {}", key, successor, e);
                }
            }
        }
        self.ring.init_alone()?;
        self.shutdown.cancel();
        Ok(())
    }
}
