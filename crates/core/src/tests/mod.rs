//! In-process network for exercising the ring protocol without sockets.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::DashSet;

use crate::dht::Did;
use crate::dht::RemoteNode;
use crate::dht::RingConfig;
use crate::dht::Stabilizer;
use crate::error::Error;
use crate::error::Result;
use crate::node::ChordNode;
use crate::remote::Directory;
use crate::remote::RemoteLink;

mod test_routing;
mod test_stabilization;

#[allow(dead_code)]
pub fn setup_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

/// Dispatches [RemoteLink] calls straight to the target [ChordNode].
///
/// Nodes are found by address. A killed node, a node that has left, or an unknown address
/// is `Unreachable`; a slowed down node answers `Timeout`.
#[derive(Default)]
pub struct MemNetwork {
    nodes: DashMap<String, Weak<ChordNode>>,
    killed: DashSet<String>,
    slow: DashSet<String>,
}

impl MemNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spawn(
        self: &Arc<Self>,
        address: &str,
        config: RingConfig,
        directory: Option<Arc<MemDirectory>>,
    ) -> Arc<ChordNode> {
        self.spawn_with_node(RemoteNode::new(address), config, directory)
    }

    pub fn spawn_with_node(
        self: &Arc<Self>,
        node: RemoteNode,
        config: RingConfig,
        directory: Option<Arc<MemDirectory>>,
    ) -> Arc<ChordNode> {
        let link: Arc<dyn RemoteLink> = self.clone();
        let directory = directory.map(|d| d as Arc<dyn Directory>);
        let address = node.address.clone();
        let node = Arc::new(ChordNode::new_with_node(node, config, link, directory));
        self.nodes.insert(address, Arc::downgrade(&node));
        node
    }

    pub fn kill(&self, address: &str) {
        self.killed.insert(address.to_string());
    }

    pub fn slow_down(&self, address: &str) {
        self.slow.insert(address.to_string());
    }

    fn peer(&self, peer: &RemoteNode) -> Result<Arc<ChordNode>> {
        if self.slow.contains(&peer.address) {
            return Err(Error::Timeout(peer.address.clone()));
        }
        let unreachable = |reason: &str| Error::Unreachable {
            address: peer.address.clone(),
            reason: reason.to_string(),
        };
        if self.killed.contains(&peer.address) {
            return Err(unreachable("killed"));
        }
        let node = self
            .nodes
            .get(&peer.address)
            .and_then(|n| n.upgrade())
            .ok_or_else(|| unreachable("unknown address"))?;
        if node.shutdown_token().is_cancelled() {
            return Err(unreachable("left the ring"));
        }
        Ok(node)
    }
}

#[async_trait]
impl RemoteLink for MemNetwork {
    async fn find_successor(&self, peer: &RemoteNode, target: Did) -> Result<RemoteNode> {
        self.peer(peer)?.find_successor(target).await
    }

    async fn find_predecessor(&self, peer: &RemoteNode, target: Did) -> Result<RemoteNode> {
        self.peer(peer)?.find_predecessor(target).await
    }

    async fn get_successor(&self, peer: &RemoteNode) -> Result<RemoteNode> {
        self.peer(peer)?.ring.successor()
    }

    async fn get_predecessor(&self, peer: &RemoteNode) -> Result<RemoteNode> {
        self.peer(peer)?.ring.predecessor()
    }

    async fn closest_preceding_finger(
        &self,
        peer: &RemoteNode,
        target: Did,
    ) -> Result<RemoteNode> {
        self.peer(peer)?.closest_preceding_finger(target)
    }

    async fn notify(&self, peer: &RemoteNode, node: &RemoteNode) -> Result<()> {
        self.peer(peer)?.notify(node.clone()).await
    }

    async fn update_predecessor(&self, peer: &RemoteNode, node: &RemoteNode) -> Result<()> {
        self.peer(peer)?.update_predecessor(node.clone())
    }

    async fn update_successor(&self, peer: &RemoteNode, node: &RemoteNode) -> Result<()> {
        self.peer(peer)?.update_successor(node.clone())
    }

    async fn update_finger_table(
        &self,
        peer: &RemoteNode,
        node: &RemoteNode,
        index: usize,
    ) -> Result<()> {
        self.peer(peer)?
            .update_finger_table(node.clone(), index)
            .await
    }

    async fn get_keys_in_interval(
        &self,
        peer: &RemoteNode,
        lower: Did,
        upper: Did,
    ) -> Result<HashMap<String, String>> {
        self.peer(peer)?.export_keys(lower, upper).await
    }

    async fn put_remote(&self, peer: &RemoteNode, key: &str, value: &str) -> Result<()> {
        self.peer(peer)?.put_local(key, value).await
    }

    async fn get_remote(&self, peer: &RemoteNode, key: &str) -> Result<String> {
        self.peer(peer)?.get_local(key).await.map_err(|e| match e {
            Error::KeyNotFound(k) => Error::RemoteFault {
                code: crate::consts::KEY_NOT_FOUND_CODE,
                message: format!("Key not found: {k}"),
            },
            e => e,
        })
    }

    async fn leave(&self, peer: &RemoteNode) -> Result<()> {
        self.peer(peer)?.leave().await
    }

    async fn is_alive(&self, peer: &RemoteNode) -> bool {
        self.peer(peer).is_ok()
    }
}

#[derive(Default)]
pub struct MemDirectory {
    members: Mutex<Vec<String>>,
}

impl MemDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn members(&self) -> Vec<String> {
        self.members.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Directory for MemDirectory {
    async fn register(&self, address: &str) -> Result<()> {
        let mut members = self
            .members
            .lock()
            .map_err(|_| Error::Directory("poisoned".into()))?;
        if !members.iter().any(|m| m == address) {
            members.push(address.to_string());
        }
        Ok(())
    }

    async fn unregister(&self, address: &str) -> Result<()> {
        let mut members = self
            .members
            .lock()
            .map_err(|_| Error::Directory("poisoned".into()))?;
        members.retain(|m| m != address);
        Ok(())
    }

    async fn list_members(&self) -> Result<Vec<String>> {
        Ok(self.members())
    }
}

/// Run `rounds` stabilization cycles on every node, in order.
pub async fn stabilize_rounds(nodes: &[Arc<ChordNode>], rounds: usize) {
    for _ in 0..rounds {
        for node in nodes {
            if node.shutdown_token().is_cancelled() {
                continue;
            }
            let _ = Stabilizer::new(node.clone()).stabilize().await;
        }
    }
}

/// Nodes sorted clockwise by id, starting from the smallest.
pub fn sorted(nodes: &[Arc<ChordNode>]) -> Vec<Arc<ChordNode>> {
    let mut sorted = nodes.to_vec();
    sorted.sort_by_key(|n| n.did());
    sorted
}

/// The node among `nodes` that owns `target`.
pub fn expected_owner(nodes: &[Arc<ChordNode>], target: Did) -> RemoteNode {
    nodes
        .iter()
        .map(|n| n.node().clone())
        .min_by_key(|n| target.distance(n.did))
        .expect("at least one node")
}

/// Start `n` nodes through a shared directory, joining one after another.
pub async fn join_nodes(
    network: &Arc<MemNetwork>,
    directory: &Arc<MemDirectory>,
    n: usize,
    config: RingConfig,
) -> Result<Vec<Arc<ChordNode>>> {
    let mut nodes = vec![];
    for i in 0..n {
        let node = network.spawn(
            &format!("127.0.0.1:{}", 9000 + i),
            config.clone(),
            Some(directory.clone()),
        );
        node.join().await?;
        nodes.push(node);
        stabilize_rounds(&nodes, 2).await;
    }
    Ok(nodes)
}

/// Every node's successor, predecessor and successor list match the sorted ring.
pub fn assert_ring_consistent(nodes: &[Arc<ChordNode>]) -> Result<()> {
    let ring = sorted(nodes);
    let n = ring.len();
    for (i, node) in ring.iter().enumerate() {
        let next = ring[(i + 1) % n].node().clone();
        let prev = ring[(i + n - 1) % n].node().clone();
        assert_eq!(
            node.ring.successor()?,
            next,
            "successor of {}",
            node.node()
        );
        assert_eq!(
            node.ring.predecessor()?,
            prev,
            "predecessor of {}",
            node.node()
        );
        let depth = node.ring.config.successor_list_size.min(n - 1);
        let expected: Vec<RemoteNode> = (1..=depth)
            .map(|k| ring[(i + k) % n].node().clone())
            .collect();
        assert_eq!(
            node.ring.successors()?,
            expected,
            "successor list of {}",
            node.node()
        );
    }
    Ok(())
}
