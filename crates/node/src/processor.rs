#![warn(missing_docs)]

//! Processor of a chord node: wires the ring to the network and drives its lifecycle.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use chord_core::dht::RingConfig;
use chord_core::dht::Stabilizer;
use chord_core::node::ChordNode;
use chord_core::remote::Directory;
use chord_core::remote::RemoteLink;
use chord_rpc::ClientConfig;
use chord_rpc::HttpRemote;

use crate::config::Config;
use crate::directory::DirectoryClient;
use crate::error::Result;
use crate::server;

/// Builds a [Processor] from a [Config], with hooks to replace its parts.
pub struct ProcessorBuilder {
    address: String,
    ring_config: RingConfig,
    client_config: ClientConfig,
    stabilize_interval: Duration,
    link: Option<Arc<dyn RemoteLink>>,
    directory: Option<Arc<dyn Directory>>,
}

/// A ring node together with its stabilizer.
pub struct Processor {
    /// The ring participant.
    pub node: Arc<ChordNode>,
    stabilizer: Arc<Stabilizer>,
    stabilize_interval: Duration,
}

impl ProcessorBuilder {
    /// Initialize from a config. The directory is the configured nameserver, if any.
    pub fn from_config(config: &Config) -> Self {
        let directory = config
            .nameserver
            .as_deref()
            .map(|ns| Arc::new(DirectoryClient::new(ns)) as Arc<dyn Directory>);
        Self {
            address: config.advertised_address().to_string(),
            ring_config: config.into(),
            client_config: config.into(),
            stabilize_interval: config.stabilize_interval(),
            link: None,
            directory,
        }
    }

    /// Advertise another address, the node id follows it.
    pub fn address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    /// Set the period of stabilization.
    pub fn stabilize_interval(mut self, interval: Duration) -> Self {
        self.stabilize_interval = interval;
        self
    }

    /// Replace the remote link, defaults to [HttpRemote].
    pub fn link(mut self, link: Arc<dyn RemoteLink>) -> Self {
        self.link = Some(link);
        self
    }

    /// Replace the membership directory.
    pub fn directory(mut self, directory: Option<Arc<dyn Directory>>) -> Self {
        self.directory = directory;
        self
    }

    /// Build the processor, the node starts as a ring of one.
    pub fn build(self) -> Processor {
        let link = self
            .link
            .unwrap_or_else(|| Arc::new(HttpRemote::new(self.client_config)));
        let node = Arc::new(ChordNode::new(
            &self.address,
            self.ring_config,
            link,
            self.directory,
        ));
        Processor {
            stabilizer: Arc::new(Stabilizer::new(node.clone())),
            node,
            stabilize_interval: self.stabilize_interval,
        }
    }
}

impl Processor {
    /// Join the ring through the directory.
    pub async fn join(&self) -> Result<()> {
        Ok(self.node.join().await?)
    }

    /// Leave the ring. The servers and the stabilizer stop afterwards.
    pub async fn leave(&self) -> Result<()> {
        Ok(self.node.leave().await?)
    }

    /// Spawn the stabilizer, it runs until the node leaves.
    pub fn start_stabilization(&self) -> tokio::task::JoinHandle<()> {
        let stabilizer = self.stabilizer.clone();
        let interval = self.stabilize_interval;
        let shutdown = self.node.shutdown_token();
        tokio::spawn(async move { stabilizer.wait(interval, shutdown).await })
    }

    /// Serve the ring RPC surface on `rpc` and the key/value front end on `http`, join the
    /// ring and stabilize until the node leaves, either through a `leave` call or ctrl-c.
    pub async fn run(&self, rpc: TcpListener, http: TcpListener) -> anyhow::Result<()> {
        let shutdown = self.node.shutdown_token();
        tracing::info!(
            "{} serves ring rpc on {}, key/value on {}",
            self.node.node(),
            rpc.local_addr()?,
            http.local_addr()?
        );

        let rpc_server = {
            let token = shutdown.clone();
            tokio::spawn(server::serve(
                rpc,
                server::ring_rpc_router(self.node.clone()),
                async move { token.cancelled().await },
            ))
        };
        let http_server = {
            let token = shutdown.clone();
            tokio::spawn(server::serve(
                http,
                server::frontend_router(self.node.clone()),
                async move { token.cancelled().await },
            ))
        };

        if let Err(e) = self.join().await {
            tracing::error!("failed to join: {}", e);
            shutdown.cancel();
        }
        let stabilization = self.start_stabilization();

        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, leaving the ring");
                if let Err(e) = self.leave().await {
                    tracing::error!("failed to leave: {}", e);
                    shutdown.cancel();
                }
            }
        }

        rpc_server.await??;
        http_server.await??;
        stabilization.await?;
        tracing::info!("{} stopped", self.node.node());
        Ok(())
    }
}

/// Bind the configured listeners and run a node until it leaves.
pub async fn run_node(config: Config) -> anyhow::Result<()> {
    let rpc = crate::util::bind(&config.rpc_addr)?;
    let http = crate::util::bind(&config.http_addr)?;
    let processor = ProcessorBuilder::from_config(&config).build();
    processor.run(rpc, http).await
}
