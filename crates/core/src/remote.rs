//! Seams to the outside world: the ring RPC surface of a peer, and the membership directory.
use std::collections::HashMap;

use async_trait::async_trait;

use crate::dht::Did;
use crate::dht::RemoteNode;
use crate::error::Result;

/// Ring protocol operations invoked on a remote peer.
///
/// Implementations keep one reusable channel per peer address and re-establish it after a
/// failure. Every call fails with [crate::error::Error::Unreachable] when the peer cannot be
/// dialed, [crate::error::Error::Timeout] when it does not answer in time, and
/// [crate::error::Error::RemoteFault] when it answers with an application error.
#[async_trait]
pub trait RemoteLink: Send + Sync {
    /// Ask `peer` to resolve the owner of `target`.
    async fn find_successor(&self, peer: &RemoteNode, target: Did) -> Result<RemoteNode>;

    /// Ask `peer` to resolve the node preceding `target`.
    async fn find_predecessor(&self, peer: &RemoteNode, target: Did) -> Result<RemoteNode>;

    async fn get_successor(&self, peer: &RemoteNode) -> Result<RemoteNode>;

    async fn get_predecessor(&self, peer: &RemoteNode) -> Result<RemoteNode>;

    /// One routing step: the node `peer` knows that most closely precedes `target`.
    async fn closest_preceding_finger(&self, peer: &RemoteNode, target: Did)
        -> Result<RemoteNode>;

    /// Tell `peer` that `node` might be its predecessor.
    async fn notify(&self, peer: &RemoteNode, node: &RemoteNode) -> Result<()>;

    async fn update_predecessor(&self, peer: &RemoteNode, node: &RemoteNode) -> Result<()>;

    async fn update_successor(&self, peer: &RemoteNode, node: &RemoteNode) -> Result<()>;

    async fn update_finger_table(
        &self,
        peer: &RemoteNode,
        node: &RemoteNode,
        index: usize,
    ) -> Result<()>;

    /// Move the pairs `peer` holds for ids in `(lower, upper]` to the caller.
    async fn get_keys_in_interval(
        &self,
        peer: &RemoteNode,
        lower: Did,
        upper: Did,
    ) -> Result<HashMap<String, String>>;

    async fn put_remote(&self, peer: &RemoteNode, key: &str, value: &str) -> Result<()>;

    async fn get_remote(&self, peer: &RemoteNode, key: &str) -> Result<String>;

    /// Ask `peer` to leave the ring.
    async fn leave(&self, peer: &RemoteNode) -> Result<()>;

    /// Bounded-time liveness probe.
    async fn is_alive(&self, peer: &RemoteNode) -> bool;
}

/// Membership directory. Its answers are only hints: listed members may be dead.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn register(&self, address: &str) -> Result<()>;

    async fn unregister(&self, address: &str) -> Result<()>;

    async fn list_members(&self) -> Result<Vec<String>>;
}
