use std::sync::Arc;
use std::time::Duration;

use crate::dht::Did;
use crate::dht::RemoteNode;
use crate::dht::RingConfig;
use crate::dht::Stabilizer;
use crate::error::Result;
use crate::tests::assert_ring_consistent;
use crate::tests::join_nodes;
use crate::tests::sorted;
use crate::tests::stabilize_rounds;
use crate::tests::MemDirectory;
use crate::tests::MemNetwork;

#[tokio::test]
async fn test_stabilization_two_nodes() -> Result<()> {
    let network = MemNetwork::new();
    let directory = MemDirectory::new();
    let nodes = join_nodes(&network, &directory, 2, RingConfig::default()).await?;
    stabilize_rounds(&nodes, 2).await;
    assert_ring_consistent(&nodes)
}

#[tokio::test]
async fn test_notify_is_idempotent() -> Result<()> {
    let network = MemNetwork::new();
    let directory = MemDirectory::new();
    let nodes = join_nodes(&network, &directory, 3, RingConfig::default()).await?;
    stabilize_rounds(&nodes, 9).await;

    let ring = sorted(&nodes);
    let (pred, node) = (&ring[0], &ring[1]);
    let before = node.ring.topo_info()?;
    node.notify(pred.node().clone()).await?;
    node.notify(pred.node().clone()).await?;
    assert_eq!(node.ring.topo_info()?, before);
    assert_eq!(node.ring.predecessor()?, *pred.node());
    Ok(())
}

#[tokio::test]
async fn test_successor_list_shrinks_after_head_failure() -> Result<()> {
    let network = MemNetwork::new();
    let directory = MemDirectory::new();
    let nodes = join_nodes(&network, &directory, 5, RingConfig::default()).await?;
    stabilize_rounds(&nodes, 15).await;
    assert_ring_consistent(&nodes)?;

    let ring = sorted(&nodes);
    let origin = ring[0].clone();
    assert_eq!(origin.ring.successors()?.len(), 3);
    network.kill(&ring[1].node().address);

    Stabilizer::new(origin.clone()).stabilize().await?;
    let successors = origin.ring.successors()?;
    assert_eq!(successors.len(), 2);
    assert_eq!(successors[0], *ring[2].node());
    assert_eq!(successors[1], *ring[3].node());
    assert_eq!(ring[2].ring.predecessor()?, *origin.node());
    Ok(())
}

#[tokio::test]
async fn test_ring_recovers_after_crash() -> Result<()> {
    let network = MemNetwork::new();
    let directory = MemDirectory::new();
    let nodes = join_nodes(&network, &directory, 6, RingConfig::default()).await?;
    stabilize_rounds(&nodes, 18).await;

    let crashed = nodes[3].clone();
    network.kill(&crashed.node().address);
    let remaining: Vec<_> = nodes
        .iter()
        .filter(|n| n.node() != crashed.node())
        .cloned()
        .collect();

    stabilize_rounds(&remaining, 15).await;
    assert_ring_consistent(&remaining)
}

#[tokio::test]
async fn test_last_successor_failure_leaves_node_alone() -> Result<()> {
    let network = MemNetwork::new();
    let directory = MemDirectory::new();
    let nodes = join_nodes(&network, &directory, 2, RingConfig::default()).await?;
    stabilize_rounds(&nodes, 3).await;

    network.kill(&nodes[1].node().address);
    Stabilizer::new(nodes[0].clone()).stabilize().await?;
    assert!(nodes[0].ring.is_alone()?);
    assert_eq!(nodes[0].ring.successor()?, *nodes[0].node());
    Ok(())
}

#[tokio::test]
async fn test_stabilizer_stops_on_shutdown() {
    let network = MemNetwork::new();
    let node = network.spawn("127.0.0.1:9300", RingConfig::default(), None);
    let token = node.shutdown_token();
    let stabilizer = Arc::new(Stabilizer::new(node.clone()));
    let handle = tokio::spawn(stabilizer.wait(Duration::from_millis(10), token.clone()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("stabilizer did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_fixed_finger_keeps_successor_list_consecutive() -> Result<()> {
    let network = MemNetwork::new();
    let spawn = |id: u32, address: &str| {
        network.spawn_with_node(
            RemoteNode::with_did(Did::from(id), address),
            RingConfig::default(),
            None,
        )
    };
    let origin = spawn(0, "n0");
    let n10 = spawn(10, "n10");
    let n20 = spawn(20, "n20");
    let n100 = spawn(100, "n100");
    origin.ring.set_successor(n10.node().clone())?;
    n10.ring.set_successor(n20.node().clone())?;
    n10.ring.set_predecessor(origin.node().clone())?;
    n20.ring.set_successor(n100.node().clone())?;
    n100.ring.set_successor(origin.node().clone())?;

    // slot 6 starts at 64, owned by 100 which is past the tail of a list not yet full
    let stabilizer = Stabilizer::new(origin.clone());
    stabilizer.fix_finger(6).await?;
    assert_eq!(origin.ring.finger_table()?.get(6)?.node, *n100.node());
    assert_eq!(origin.ring.successors()?, vec![n10.node().clone()]);

    // the list repair still reaches 100 hop by hop
    stabilizer.stabilize().await?;
    assert_eq!(
        origin.ring.successors()?,
        vec![n10.node().clone(), n20.node().clone(), n100.node().clone()]
    );
    Ok(())
}
