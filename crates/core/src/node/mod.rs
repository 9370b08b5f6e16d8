//! A ring participant: ring state, local object store and the link to its peers.
#![warn(missing_docs)]
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::dht::Did;
use crate::dht::PeerRing;
use crate::dht::RemoteNode;
use crate::dht::RingConfig;
use crate::error::Result;
use crate::inspect::RingInspect;
use crate::remote::Directory;
use crate::remote::RemoteLink;
use crate::storage::ObjectStore;

mod kv;
mod membership;
mod routing;

/// ChordNode ties a [PeerRing] to the network.
///
/// Every operation of the ring RPC surface has a method here with the same meaning, so an
/// RPC server is a thin dispatch layer over it. Outbound calls go through the
/// [RemoteLink]; the [PeerRing] lock is never held while one is in flight.
pub struct ChordNode {
    /// View of the ring.
    pub ring: PeerRing,
    /// Pairs owned by this node.
    pub store: ObjectStore,
    link: Arc<dyn RemoteLink>,
    directory: Option<Arc<dyn Directory>>,
    shutdown: CancellationToken,
}

impl ChordNode {
    /// Create a node advertised at `address`. Its id is the digest of the address.
    pub fn new(
        address: &str,
        config: RingConfig,
        link: Arc<dyn RemoteLink>,
        directory: Option<Arc<dyn Directory>>,
    ) -> Self {
        Self::new_with_node(RemoteNode::new(address), config, link, directory)
    }

    /// Create a node with an explicit identity.
    pub fn new_with_node(
        node: RemoteNode,
        config: RingConfig,
        link: Arc<dyn RemoteLink>,
        directory: Option<Arc<dyn Directory>>,
    ) -> Self {
        Self {
            ring: PeerRing::new(node, config),
            store: ObjectStore::new(),
            link,
            directory,
            shutdown: CancellationToken::new(),
        }
    }

    /// The node itself.
    pub fn node(&self) -> &RemoteNode {
        &self.ring.node
    }

    /// Did of the node.
    pub fn did(&self) -> Did {
        self.ring.node.did
    }

    /// The link used for outbound calls.
    pub fn link(&self) -> &Arc<dyn RemoteLink> {
        &self.link
    }

    /// Cancelled once the node has left the ring.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Snapshot for diagnostics.
    pub async fn inspect(&self) -> Result<RingInspect> {
        RingInspect::inspect(self).await
    }
}
