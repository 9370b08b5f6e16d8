//! Successor list for Chord
use serde::Deserialize;
use serde::Serialize;

use super::types::RemoteNode;
use crate::dht::Did;

/// Ordered list of the next nodes clockwise from `did`.
///
/// Entries are sorted by ring distance from `did`, unique by id, never contain `did` itself
/// and never exceed `max`. An empty list means the node is alone on the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessorSeq {
    /// self id
    did: Did,
    /// max successor
    max: usize,
    /// successor's list
    successors: Vec<RemoteNode>,
}

impl SuccessorSeq {
    /// create a new successor list
    pub fn new(did: Did, max: usize) -> Self {
        Self {
            did,
            max: max.max(1),
            successors: vec![],
        }
    }

    /// True when the node is alone.
    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    /// Whether the list reached its depth.
    pub fn is_full(&self) -> bool {
        self.successors.len() >= self.max
    }

    /// length
    pub fn len(&self) -> usize {
        self.successors.len()
    }

    /// depth
    pub fn max(&self) -> usize {
        self.max
    }

    /// Nearest successor.
    pub fn head(&self) -> Option<&RemoteNode> {
        self.successors.first()
    }

    /// getter
    pub fn get(&self, index: usize) -> Option<&RemoteNode> {
        self.successors.get(index)
    }

    /// All entries, nearest first.
    pub fn list(&self) -> &[RemoteNode] {
        &self.successors
    }

    /// Whether `did` is listed.
    pub fn contains(&self, did: Did) -> bool {
        self.successors.iter().any(|s| s.did == did)
    }

    fn normalize(&mut self) {
        let did = self.did;
        self.successors.sort_by_key(|s| did.distance(s.did));
        self.successors.dedup_by_key(|s| s.did);
        self.successors.truncate(self.max);
    }

    /// Insert a node at its ring position. Returns true if the node is in the list afterwards
    /// and was not before.
    pub fn update(&mut self, node: RemoteNode) -> bool {
        if node.did == self.did || self.contains(node.did) {
            return false;
        }
        let did = node.did;
        self.successors.push(node);
        self.normalize();
        self.contains(did)
    }

    /// Force `node` to become the head: entries strictly between self and `node` are dropped.
    pub fn set_head(&mut self, node: RemoteNode) {
        if node.did == self.did {
            self.successors.clear();
            return;
        }
        let (me, head) = (self.did, node.did);
        self.successors
            .retain(|s| s.did != head && !s.did.in_open(me, head));
        self.successors.insert(0, node);
        self.successors.truncate(self.max);
    }

    /// `anchor` reported `next` as its successor: drop what we believed lies between them
    /// and insert `next`.
    pub fn splice(&mut self, anchor: Did, next: RemoteNode) {
        if next.did == anchor {
            return;
        }
        if next.did == self.did {
            // anchor's successor is us, everything after anchor is stale
            let me = self.did;
            let bound = me.distance(anchor);
            self.successors.retain(|s| me.distance(s.did) <= bound);
            return;
        }
        let head = next.did;
        self.successors.retain(|s| !s.did.in_open(anchor, head));
        self.update(next);
    }

    /// Drop the head, returning it.
    pub fn skip_head(&mut self) -> Option<RemoteNode> {
        if self.successors.is_empty() {
            None
        } else {
            Some(self.successors.remove(0))
        }
    }

    /// Remove `did`, returns whether it was listed.
    pub fn remove(&mut self, did: Did) -> bool {
        let len = self.successors.len();
        self.successors.retain(|s| s.did != did);
        len != self.successors.len()
    }

    /// Forget every successor.
    pub fn clear(&mut self) {
        self.successors.clear()
    }
}
