#![warn(missing_docs)]
use serde::Deserialize;
use serde::Serialize;

use super::types::FingerEntry;
use super::types::RemoteNode;
use crate::dht::Did;
use crate::error::Error;
use crate::error::Result;

/// Finger table of Chord DHT.
///
/// Slot `i` caches the node believed to be the successor of `owner + 2^i`. A fresh table
/// points every slot at the owner, which is exactly right for a ring of one. Slot 0 is the
/// successor shortcut and is kept in sync with the head of the successor list by
/// [super::PeerRing].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerTable {
    owner: RemoteNode,
    entries: Vec<FingerEntry>,
}

impl FingerTable {
    /// builder
    pub fn new(owner: RemoteNode, size: usize) -> Self {
        let entries = (0..size.min(Did::BITS))
            .map(|i| FingerEntry {
                start: owner.did.power2_offset(i),
                node: owner.clone(),
            })
            .collect();
        Self { owner, entries }
    }

    /// Node in slot 0.
    pub fn first(&self) -> RemoteNode {
        self.entries
            .first()
            .map(|e| e.node.clone())
            .unwrap_or_else(|| self.owner.clone())
    }

    /// getter
    pub fn get(&self, index: usize) -> Result<&FingerEntry> {
        self.entries
            .get(index)
            .ok_or(Error::InvalidFingerIndex(index))
    }

    /// Start identifier of slot `index`.
    pub fn start(&self, index: usize) -> Result<Did> {
        self.get(index).map(|e| e.start)
    }

    /// setter
    pub fn set(&mut self, index: usize, node: RemoteNode) -> Result<()> {
        let size = self.entries.len();
        let entry = self.entries.get_mut(index).ok_or_else(|| {
            tracing::warn!("set finger index out of range, index: {}", index);
            Error::InvalidFingerIndex(index)
        })?;
        tracing::debug!("set finger {}/{} to {}", index, size, node);
        entry.node = node;
        Ok(())
    }

    /// Point every slot back at the owner.
    pub fn reset(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.node = self.owner.clone();
        }
    }

    /// Remove a node from the table. Each slot holding it is filled with the node of the
    /// next slot, or with the owner if no later slot survives.
    pub fn remove(&mut self, did: Did) {
        let mut replacement = self.owner.clone();
        for entry in self.entries.iter_mut().rev() {
            if entry.node.did == did {
                entry.node = replacement.clone();
            } else {
                replacement = entry.node.clone();
            }
        }
    }

    /// Offer a newly seen node to every slot. A slot takes it when the node sits in
    /// `[start, current)`, i.e. it is a closer successor of `start` than the current entry.
    pub fn learn(&mut self, node: &RemoteNode) {
        if node.did == self.owner.did {
            return;
        }
        for entry in self.entries.iter_mut() {
            if entry.node.did == entry.start {
                continue;
            }
            if node.did.in_left_closed(entry.start, entry.node.did) {
                entry.node = node.clone();
            }
        }
    }

    /// Scan from the farthest slot down and return the first node strictly inside
    /// `(owner, target)`.
    pub fn closest_preceding(&self, target: Did) -> Option<RemoteNode> {
        self.entries
            .iter()
            .rev()
            .map(|e| &e.node)
            .find(|n| n.did.in_open(self.owner.did, target))
            .cloned()
    }

    /// Whether any slot points at `did`.
    pub fn contains(&self, did: Did) -> bool {
        self.entries.iter().any(|e| e.node.did == did)
    }

    /// number of slots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All slots.
    pub fn list(&self) -> &[FingerEntry] {
        &self.entries
    }
}
