//! Stabilization run daemons to maintain dht.

use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use futures::pin_mut;
use futures::select;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::dht::Did;
use crate::dht::RemoteNode;
use crate::error::Result;
use crate::node::ChordNode;

/// The stabilization runner.
///
/// One cycle checks the successor, corrects it, notifies it, repairs the successor list
/// and fixes one random finger. Transport failures of the successor are handled by
/// skipping it; every other failure is logged and the cycle goes on.
#[derive(Clone)]
pub struct Stabilizer {
    node: Arc<ChordNode>,
}

impl Stabilizer {
    /// Create a new stabilization runner.
    pub fn new(node: Arc<ChordNode>) -> Self {
        Self { node }
    }

    /// Run stabilization once.
    pub async fn stabilize(&self) -> Result<()> {
        tracing::debug!("STABILIZATION check_successor start");
        let (reported, skipped) = match self.check_successor().await? {
            Some(checked) => checked,
            None => {
                tracing::debug!("STABILIZATION alone, nothing to do");
                return Ok(());
            }
        };
        tracing::debug!("STABILIZATION check_successor end");

        if !skipped {
            if let Err(e) = self.correct_successor(reported).await {
                tracing::error!("[stabilize] Failed on correct successor {:?}", e);
            }
        }
        if let Err(e) = self.notify_successor().await {
            tracing::error!("[stabilize] Failed on notify successor {:?}", e);
        }
        if let Err(e) = self.fix_successor_list(!skipped).await {
            tracing::error!("[stabilize] Failed on fix successor list {:?}", e);
        }
        if !skipped {
            if let Err(e) = self.fix_fingers().await {
                tracing::error!("[stabilize] Failed on fix_finger {:?}", e);
            }
        }
        Ok(())
    }

    /// Ask the head successor for its predecessor, skipping successors that do not answer.
    /// Returns the reported predecessor and whether a skip happened, or None once the list
    /// ran empty.
    async fn check_successor(&self) -> Result<Option<(RemoteNode, bool)>> {
        let ring = &self.node.ring;
        let mut skipped = false;
        loop {
            let successor = match ring.successors()?.first() {
                Some(s) => s.clone(),
                None => {
                    if skipped {
                        tracing::warn!("{} lost every successor", self.node.node());
                    }
                    return Ok(None);
                }
            };
            match self.node.link().get_predecessor(&successor).await {
                Ok(reported) => return Ok(Some((reported, skipped))),
                Err(e) if e.is_transport() => {
                    tracing::warn!("STABILIZATION successor {} failed: {}", successor, e);
                    ring.skip_successor()?;
                    skipped = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Adopt `reported` as successor if it sits between us and the current successor.
    async fn correct_successor(&self, reported: RemoteNode) -> Result<()> {
        let ring = &self.node.ring;
        let me = self.node.did();
        let successor = ring.successor()?;
        if !reported.did.in_open(me, successor.did) {
            return Ok(());
        }
        if !self.node.link().is_alive(&reported).await {
            tracing::debug!("STABILIZATION ignore dead candidate {}", reported);
            return Ok(());
        }
        tracing::info!("STABILIZATION {} new successor {}", me, reported);
        ring.set_successor(reported.clone())?;
        self.node.pull_keys(&reported).await;
        Ok(())
    }

    /// Notify successor, this is a DHT operation.
    async fn notify_successor(&self) -> Result<()> {
        let successor = self.node.ring.successor()?;
        if successor == *self.node.node() {
            return Ok(());
        }
        self.node.link().notify(&successor, self.node.node()).await
    }

    /// Walk the successor list pairwise and let entry `i` tell us entry `i + 1`.
    /// An unreachable entry is spliced out and the walk stops. The tail is asked for its
    /// successor only when `grow` is set and the list is not full.
    async fn fix_successor_list(&self, grow: bool) -> Result<()> {
        let ring = &self.node.ring;
        let max = ring.config.successor_list_size;
        let mut index = 0;
        loop {
            let list = ring.successors()?;
            let anchor = match list.get(index) {
                Some(a) => a.clone(),
                None => break,
            };
            let is_tail = index + 1 >= list.len();
            if is_tail && (!grow || list.len() >= max) {
                break;
            }
            match self.node.link().get_successor(&anchor).await {
                Ok(next) => {
                    let wrapped = next == *self.node.node();
                    ring.splice_successor_list(anchor.did, next)?;
                    if wrapped {
                        break;
                    }
                }
                Err(e) if e.is_transport() => {
                    tracing::warn!("STABILIZATION drop unreachable successor {}", anchor);
                    ring.remove_successor(anchor.did)?;
                    break;
                }
                Err(e) => return Err(e),
            }
            index += 1;
        }
        Ok(())
    }

    /// Fix one random finger, this is a DHT operation.
    async fn fix_fingers(&self) -> Result<()> {
        let index = rand::thread_rng().gen_range(1..Did::BITS);
        self.fix_finger(index).await
    }

    /// Point finger `index` at the owner of its start. The owner joins the successor list
    /// only when it falls between existing successors.
    pub(crate) async fn fix_finger(&self, index: usize) -> Result<()> {
        let ring = &self.node.ring;
        let start = ring.finger_start(index)?;
        let node = self.node.find_successor(start).await?;
        tracing::debug!("STABILIZATION fix_fingers: {} -> {}", index, node);
        ring.set_finger(index, node.clone())?;
        ring.update_adjacent_successor(node)?;
        Ok(())
    }

    /// Run stabilization in a loop until `shutdown` is cancelled. A running cycle is
    /// always finished.
    pub async fn wait(self: Arc<Self>, interval: Duration, shutdown: CancellationToken) {
        loop {
            let timeout = tokio::time::sleep(interval).fuse();
            let cancelled = shutdown.cancelled().fuse();
            pin_mut!(timeout);
            pin_mut!(cancelled);
            select! {
                _ = cancelled => {
                    tracing::info!("stabilizer of {} stopped", self.node.node());
                    break;
                }
                _ = timeout => self
                    .stabilize()
                    .await
                    .unwrap_or_else(|e| tracing::error!("failed to stabilize {:?}", e)),
            }
        }
    }
}
