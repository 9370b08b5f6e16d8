//! Value types shared by the ring state, routing and the wire.
#![warn(missing_docs)]
use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;

use super::did::hash_of;
use super::did::Did;
use crate::consts::DEFAULT_MAX_LOOKUP_HOPS;
use crate::consts::DEFAULT_SUCCESSOR_LIST_SIZE;

/// A peer as seen by other peers: its ring position and where to reach it.
///
/// Two values describe the same peer if their ids are equal; the address only says how to
/// dial it. A neighbor is replaced by replacing the whole value, never by patching a field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteNode {
    /// Ring position, the digest of the advertised address.
    pub did: Did,
    /// Advertised RPC address, `host:port`.
    pub address: String,
}

impl RemoteNode {
    /// Build the node advertised at `address`, its id is the digest of the address.
    pub fn new(address: &str) -> Self {
        Self {
            did: hash_of(address),
            address: address.to_string(),
        }
    }

    /// Build a node with an explicit id.
    pub fn with_did(did: Did, address: &str) -> Self {
        Self {
            did,
            address: address.to_string(),
        }
    }
}

impl PartialEq for RemoteNode {
    fn eq(&self, other: &Self) -> bool {
        self.did == other.did
    }
}

impl Eq for RemoteNode {}

impl Hash for RemoteNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.did.hash(state)
    }
}

impl std::fmt::Display for RemoteNode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}@{}", self.did, self.address)
    }
}

/// One slot of the finger table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerEntry {
    /// `self + 2^i`, the identifier this slot is responsible for.
    pub start: Did,
    /// The node believed to be the successor of `start`.
    pub node: RemoteNode,
}

/// Tunables of one ring participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    /// Max length of the successor list.
    pub successor_list_size: usize,
    /// Max hops of a single lookup before the best candidate is returned.
    pub max_lookup_hops: usize,
    /// Pre-seed the fingers of other nodes when joining.
    pub announce_on_join: bool,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            successor_list_size: DEFAULT_SUCCESSOR_LIST_SIZE,
            max_lookup_hops: DEFAULT_MAX_LOOKUP_HOPS,
            announce_on_join: false,
        }
    }
}

/// Neighborhood of a node, returned by [super::PeerRing::topo_info].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopoInfo {
    /// Successor list, nearest first.
    pub successors: Vec<RemoteNode>,
    /// Current predecessor, the node itself when unknown.
    pub predecessor: RemoteNode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_node_identity() {
        let a = RemoteNode::new("127.0.0.1:8011");
        let b = RemoteNode::with_did(a.did, "10.0.0.1:8011");
        assert_eq!(a, b);
        assert_eq!(a.did, hash_of("127.0.0.1:8011"));
        assert_ne!(a, RemoteNode::new("127.0.0.1:8012"));
    }
}
