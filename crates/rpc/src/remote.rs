//! Connection pool to ring peers over JSON-RPC.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chord_core::consts::INIT_TOKEN;
use chord_core::dht::Did;
use chord_core::dht::RemoteNode;
use chord_core::error::Error;
use chord_core::error::Result;
use chord_core::remote::RemoteLink;
use dashmap::DashMap;

use crate::jsonrpc::Client;
use crate::jsonrpc::RpcError;
use crate::types::*;

/// Timeouts of the ring connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Upper bound of a single call.
    pub call_timeout: Duration,
    /// Upper bound of a liveness probe.
    pub probe_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(1),
        }
    }
}

/// Keeps one handshaken [Client] per peer address. A client that failed at transport level
/// is dropped and re-dialed by the next call.
pub struct HttpRemote {
    config: ClientConfig,
    clients: DashMap<String, Arc<Client>>,
}

/// Classify a client error against the ring error taxonomy.
pub fn into_ring_error(address: &str, e: RpcError) -> Error {
    match e {
        RpcError::Timeout => Error::Timeout(address.to_string()),
        RpcError::Connect(reason) | RpcError::Client(reason) => Error::Unreachable {
            address: address.to_string(),
            reason,
        },
        RpcError::JsonClientError(e) => Error::RemoteFault {
            code: e.code.code(),
            message: e.message,
        },
        RpcError::ParseError(what, e) => Error::RemoteFault {
            code: jsonrpc_core::ErrorCode::ParseError.code(),
            message: format!("{}: {}", what, e),
        },
    }
}

impl HttpRemote {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            clients: DashMap::new(),
        }
    }

    /// Number of cached connections.
    pub fn pooled(&self) -> usize {
        self.clients.len()
    }

    async fn connect(&self, address: &str) -> Result<Arc<Client>> {
        if let Some(client) = self.clients.get(address) {
            return Ok(client.value().clone());
        }
        let url = format!("http://{}", address);
        let client = Client::new_with_timeout(&url, self.config.call_timeout)
            .map_err(|e| into_ring_error(address, e))?;
        let echoed = client
            .init(&InitMessage {
                token: INIT_TOKEN.to_string(),
            })
            .await
            .map_err(|e| into_ring_error(address, e))?;
        if echoed.token != INIT_TOKEN {
            return Err(Error::Unreachable {
                address: address.to_string(),
                reason: format!("handshake answered {:?}", echoed.token),
            });
        }
        tracing::debug!("connected to {}", address);
        Ok(self
            .clients
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(client))
            .value()
            .clone())
    }

    fn disconnect(&self, address: &str) {
        if self.clients.remove(address).is_some() {
            tracing::debug!("dropped connection to {}", address);
        }
    }

    /// Run `f` on the client of `peer`, evicting the client on transport failure.
    async fn call<T, F, Fut>(&self, peer: &RemoteNode, f: F) -> Result<T>
    where
        F: FnOnce(Arc<Client>) -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, RpcError>>,
    {
        let client = match self.connect(&peer.address).await {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("failed to connect {}: {}", peer, e);
                return Err(e);
            }
        };
        match f(client).await {
            Ok(v) => Ok(v),
            Err(e) => {
                let err = into_ring_error(&peer.address, e);
                if err.is_transport() {
                    self.disconnect(&peer.address);
                }
                Err(err)
            }
        }
    }
}

impl Default for HttpRemote {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[async_trait]
impl RemoteLink for HttpRemote {
    async fn find_successor(&self, peer: &RemoteNode, target: Did) -> Result<RemoteNode> {
        self.call(peer, |c| async move {
            c.find_successor(&TargetRequest { target }).await
        })
        .await
    }

    async fn find_predecessor(&self, peer: &RemoteNode, target: Did) -> Result<RemoteNode> {
        self.call(peer, |c| async move {
            c.find_predecessor(&TargetRequest { target }).await
        })
        .await
    }

    async fn get_successor(&self, peer: &RemoteNode) -> Result<RemoteNode> {
        self.call(peer, |c| async move { c.get_successor().await })
            .await
    }

    async fn get_predecessor(&self, peer: &RemoteNode) -> Result<RemoteNode> {
        self.call(peer, |c| async move { c.get_predecessor().await })
            .await
    }

    async fn closest_preceding_finger(
        &self,
        peer: &RemoteNode,
        target: Did,
    ) -> Result<RemoteNode> {
        self.call(peer, |c| async move {
            c.closest_preceding_finger(&TargetRequest { target }).await
        })
        .await
    }

    async fn notify(&self, peer: &RemoteNode, node: &RemoteNode) -> Result<()> {
        let req = NodeRequest { node: node.clone() };
        self.call(peer, |c| async move { c.notify(&req).await })
            .await?;
        Ok(())
    }

    async fn update_predecessor(&self, peer: &RemoteNode, node: &RemoteNode) -> Result<()> {
        let req = NodeRequest { node: node.clone() };
        self.call(peer, |c| async move { c.update_predecessor(&req).await })
            .await?;
        Ok(())
    }

    async fn update_successor(&self, peer: &RemoteNode, node: &RemoteNode) -> Result<()> {
        let req = NodeRequest { node: node.clone() };
        self.call(peer, |c| async move { c.update_successor(&req).await })
            .await?;
        Ok(())
    }

    async fn update_finger_table(
        &self,
        peer: &RemoteNode,
        node: &RemoteNode,
        index: usize,
    ) -> Result<()> {
        let req = FingerUpdateRequest {
            node: node.clone(),
            index,
        };
        self.call(peer, |c| async move { c.update_finger_table(&req).await })
            .await?;
        Ok(())
    }

    async fn get_keys_in_interval(
        &self,
        peer: &RemoteNode,
        lower: Did,
        upper: Did,
    ) -> Result<HashMap<String, String>> {
        self.call(peer, |c| async move {
            c.get_keys_in_interval(&IntervalRequest { lower, upper })
                .await
        })
        .await
    }

    async fn put_remote(&self, peer: &RemoteNode, key: &str, value: &str) -> Result<()> {
        let req = KeyValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.call(peer, |c| async move { c.put_remote(&req).await })
            .await?;
        Ok(())
    }

    async fn get_remote(&self, peer: &RemoteNode, key: &str) -> Result<String> {
        let req = KeyRequest {
            key: key.to_string(),
        };
        let pair = self
            .call(peer, |c| async move { c.get_remote(&req).await })
            .await?;
        Ok(pair.value)
    }

    async fn leave(&self, peer: &RemoteNode) -> Result<()> {
        self.call(peer, |c| async move { c.leave().await }).await?;
        Ok(())
    }

    async fn is_alive(&self, peer: &RemoteNode) -> bool {
        let probe = self.call(peer, |c| async move {
            c.init(&InitMessage {
                token: INIT_TOKEN.to_string(),
            })
            .await
        });
        match tokio::time::timeout(self.config.probe_timeout, probe).await {
            Ok(Ok(echoed)) => echoed.token == INIT_TOKEN,
            Ok(Err(e)) => {
                tracing::debug!("probe of {} failed: {}", peer, e);
                false
            }
            Err(_) => {
                tracing::debug!("probe of {} timed out", peer);
                false
            }
        }
    }
}
