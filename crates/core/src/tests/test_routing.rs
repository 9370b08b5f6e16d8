use num_bigint::BigUint;

use crate::dht::Did;
use crate::dht::RemoteNode;
use crate::dht::RingConfig;
use crate::error::Error;
use crate::error::Result;
use crate::tests::join_nodes;
use crate::tests::sorted;
use crate::tests::stabilize_rounds;
use crate::tests::MemDirectory;
use crate::tests::MemNetwork;

#[tokio::test]
async fn test_lookup_of_own_id() -> Result<()> {
    let network = MemNetwork::new();
    let directory = MemDirectory::new();
    let nodes = join_nodes(&network, &directory, 4, RingConfig::default()).await?;
    stabilize_rounds(&nodes, 12).await;

    for node in nodes.iter() {
        assert_eq!(node.find_successor(node.did()).await?, *node.node());
        assert_eq!(
            node.find_predecessor(node.did()).await?,
            node.ring.predecessor()?
        );
    }
    Ok(())
}

async fn lookup_skips_failed_successor(slow: bool) -> Result<()> {
    let network = MemNetwork::new();
    let directory = MemDirectory::new();
    let nodes = join_nodes(&network, &directory, 5, RingConfig::default()).await?;
    stabilize_rounds(&nodes, 15).await;

    let ring = sorted(&nodes);
    let (origin, failed, next) = (&ring[0], &ring[1], &ring[2]);
    if slow {
        network.slow_down(&failed.node().address);
    } else {
        network.kill(&failed.node().address);
    }

    // no stabilization in between, the lookup itself routes around the failure
    assert_eq!(origin.find_successor(next.did()).await?, *next.node());
    // slot 0 follows the successor list, which only stabilization repairs
    let fingers = origin.ring.finger_table()?;
    assert!(fingers.list()[1..].iter().all(|e| e.node != *failed.node()));
    Ok(())
}

#[tokio::test]
async fn test_lookup_skips_unreachable_successor() -> Result<()> {
    lookup_skips_failed_successor(false).await
}

#[tokio::test]
async fn test_lookup_skips_timed_out_successor() -> Result<()> {
    lookup_skips_failed_successor(true).await
}

#[tokio::test]
async fn test_lookup_routes_around_failure_past_first_hop() -> Result<()> {
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
    let n100 = spawn(100, "n100");
    let n150 = spawn(150, "n150");
    let n180 = spawn(180, "n180");

    // origin only reaches 100 through a finger, 100 knows the nodes after it
    origin.ring.set_successor(n10.node().clone())?;
    origin.ring.set_finger(6, n100.node().clone())?;
    n10.ring.set_successor(n100.node().clone())?;
    n100.ring.set_successor(n150.node().clone())?;
    n100.ring.update_successors(n180.node().clone())?;
    n150.ring.set_successor(n180.node().clone())?;
    n180.ring.set_successor(origin.node().clone())?;

    network.kill(&n150.node().address);

    let target = Did::from(170u32);
    assert_eq!(origin.find_successor(target).await?, *n180.node());
    assert_eq!(origin.find_predecessor(target).await?, *n100.node());
    // keys below the failed node still resolve through the same hop
    assert_eq!(
        origin.find_successor(Did::from(90u32)).await?,
        *n100.node()
    );
    Ok(())
}

#[tokio::test]
async fn test_routing_exhausted() -> Result<()> {
    let network = MemNetwork::new();
    let config = RingConfig {
        successor_list_size: 1,
        ..RingConfig::default()
    };
    let origin = network.spawn_with_node(RemoteNode::with_did(Did::zero(), "origin"), config, None);

    // neither of them is reachable
    let successor = RemoteNode::with_did(Did::from(10u32), "successor");
    let far = RemoteNode::with_did(
        Did::from(BigUint::from(2u16).pow(100) + BigUint::from(5u16)),
        "far",
    );
    origin.ring.set_successor(successor)?;
    origin.ring.set_finger(100, far.clone())?;

    let target = far.did + Did::from(1u32);
    match origin.find_successor(target).await {
        Err(Error::RoutingExhausted(did)) => assert_eq!(did, target),
        other => panic!("unexpected lookup result {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_lookup_hop_bound() -> Result<()> {
    let network = MemNetwork::new();
    let directory = MemDirectory::new();
    let config = RingConfig {
        max_lookup_hops: 1,
        ..RingConfig::default()
    };
    let nodes = join_nodes(&network, &directory, 6, config).await?;
    stabilize_rounds(&nodes, 18).await;

    // a bounded lookup still answers with a live node
    let ring = sorted(&nodes);
    let target = ring[4].did();
    let answer = ring[0].find_successor(target).await?;
    assert!(ring.iter().any(|n| *n.node() == answer));
    Ok(())
}
