use std::sync::Arc;
use std::time::Duration;

use chord_core::dht::RemoteNode;
use chord_core::remote::Directory;
use chord_rpc::jsonrpc::Client;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::directory::DirectoryClient;
use crate::processor::Processor;
use crate::processor::ProcessorBuilder;
use crate::server;
use crate::util;

struct RunningNode {
    processor: Arc<Processor>,
    rpc_addr: String,
    http_addr: String,
    handle: JoinHandle<anyhow::Result<()>>,
}

fn spawn_nameserver(shutdown: &CancellationToken) -> String {
    let listener = util::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let token = shutdown.clone();
    tokio::spawn(server::run_nameserver(listener, async move {
        token.cancelled().await
    }));
    addr
}

fn spawn_node(nameserver: &str) -> RunningNode {
    let rpc = util::bind("127.0.0.1:0").unwrap();
    let http = util::bind("127.0.0.1:0").unwrap();
    let rpc_addr = rpc.local_addr().unwrap().to_string();
    let http_addr = http.local_addr().unwrap().to_string();
    let config = Config {
        rpc_addr: rpc_addr.clone(),
        http_addr: http_addr.clone(),
        nameserver: Some(nameserver.to_string()),
        ..Default::default()
    };
    let processor = Arc::new(
        ProcessorBuilder::from_config(&config)
            .stabilize_interval(Duration::from_millis(100))
            .build(),
    );
    let p = processor.clone();
    let handle = tokio::spawn(async move { p.run(rpc, http).await });
    RunningNode {
        processor,
        rpc_addr,
        http_addr,
        handle,
    }
}

fn is_converged(nodes: &[&RunningNode]) -> bool {
    let mut ring: Vec<RemoteNode> = nodes
        .iter()
        .map(|n| n.processor.node.node().clone())
        .collect();
    ring.sort_by_key(|n| n.did);
    let len = ring.len();
    nodes.iter().all(|n| {
        let me = n.processor.node.node();
        let Some(i) = ring.iter().position(|r| r == me) else {
            return false;
        };
        let succ = n.processor.node.ring.successor().ok();
        let pred = n.processor.node.ring.predecessor().ok();
        succ.as_ref() == Some(&ring[(i + 1) % len]) && pred.as_ref() == Some(&ring[(i + len - 1) % len])
    })
}

async fn wait_converged(nodes: &[&RunningNode]) {
    for _ in 0..150 {
        if is_converged(nodes) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("ring of {} nodes did not converge", nodes.len());
}

#[tokio::test]
async fn test_nameserver_membership() {
    let shutdown = CancellationToken::new();
    let ns = spawn_nameserver(&shutdown);
    let directory = DirectoryClient::new(&ns);

    directory.register("127.0.0.1:9001").await.unwrap();
    directory.register("127.0.0.1:9002").await.unwrap();
    directory.register("127.0.0.1:9001").await.unwrap();
    assert_eq!(
        directory.list_members().await.unwrap(),
        vec!["127.0.0.1:9001".to_string(), "127.0.0.1:9002".to_string()]
    );

    directory.unregister("127.0.0.1:9001").await.unwrap();
    directory.unregister("127.0.0.1:9003").await.unwrap();
    assert_eq!(directory.list_members().await.unwrap(), vec![
        "127.0.0.1:9002".to_string()
    ]);
    shutdown.cancel();
}

#[tokio::test]
async fn test_single_node_serves_keys() {
    let shutdown = CancellationToken::new();
    let ns = spawn_nameserver(&shutdown);
    let node = spawn_node(&ns);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(node.processor.node.ring.is_alone().unwrap());

    let http = reqwest::Client::new();
    let resp = http
        .put(format!("http://{}/fruit", node.http_addr))
        .body("apple")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let resp = http
        .get(format!("http://{}/fruit", node.http_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "apple");

    let resp = http
        .get(format!("http://{}/missing", node.http_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let state: serde_json::Value = http
        .get(format!("http://{}/state", node.http_addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["self"]["address"], node.rpc_addr.as_str());
    assert_eq!(state["successor"]["address"], node.rpc_addr.as_str());
    assert_eq!(state["successor_list"], serde_json::json!([]));

    node.processor.leave().await.unwrap();
    node.handle.await.unwrap().unwrap();
    shutdown.cancel();
}

#[tokio::test]
async fn test_ring_over_http() {
    let shutdown = CancellationToken::new();
    let ns = spawn_nameserver(&shutdown);

    let mut nodes = vec![];
    for _ in 0..3 {
        nodes.push(spawn_node(&ns));
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    wait_converged(&nodes.iter().collect::<Vec<_>>()).await;

    let http = reqwest::Client::new();
    for i in 0..12 {
        let writer = &nodes[i % nodes.len()];
        let resp = http
            .put(format!("http://{}/key-{}", writer.http_addr, i))
            .body(format!("value-{}", i))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
    for i in 0..12 {
        let reader = &nodes[(i + 1) % nodes.len()];
        let resp = http
            .get(format!("http://{}/key-{}", reader.http_addr, i))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), format!("value-{}", i));
    }

    // the leaving node hands its keys and its neighbors over
    let leaving = nodes.remove(0);
    Client::new(&format!("http://{}", leaving.rpc_addr))
        .leave()
        .await
        .unwrap();
    leaving.handle.await.unwrap().unwrap();
    assert_eq!(leaving.processor.node.store.count().await.unwrap(), 0);

    wait_converged(&nodes.iter().collect::<Vec<_>>()).await;
    let members = DirectoryClient::new(&ns).list_members().await.unwrap();
    assert!(!members.contains(&leaving.rpc_addr));

    for i in 0..12 {
        let reader = &nodes[i % nodes.len()];
        let resp = http
            .get(format!("http://{}/key-{}", reader.http_addr, i))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "key-{} lost", i);
        assert_eq!(resp.text().await.unwrap(), format!("value-{}", i));
    }

    for node in nodes {
        node.processor.leave().await.unwrap();
        node.handle.await.unwrap().unwrap();
    }
    shutdown.cancel();
}
