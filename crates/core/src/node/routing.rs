//! Finger-accelerated iterative lookup with successor-list fallback.
use std::collections::HashSet;

use super::ChordNode;
use crate::dht::Did;
use crate::dht::RemoteNode;
use crate::error::Error;
use crate::error::Result;

impl ChordNode {
    /// The node owning `target`, i.e. the first node at or after it on the ring.
    pub async fn find_successor(&self, target: Did) -> Result<RemoteNode> {
        Ok(self.lookup(target).await?.1)
    }

    /// The node whose successor owns `target`.
    pub async fn find_predecessor(&self, target: Did) -> Result<RemoteNode> {
        Ok(self.lookup(target).await?.0)
    }

    /// Local routing step, see [crate::dht::PeerRing::closest_preceding_finger].
    pub fn closest_preceding_finger(&self, target: Did) -> Result<RemoteNode> {
        self.ring.closest_preceding_finger(target)
    }

    async fn successor_of(&self, node: &RemoteNode) -> Result<RemoteNode> {
        if node == self.node() {
            self.ring.successor()
        } else {
            self.link.get_successor(node).await
        }
    }

    async fn closest_preceding_of(&self, node: &RemoteNode, target: Did) -> Result<RemoteNode> {
        if node == self.node() {
            self.ring.closest_preceding_finger(target)
        } else {
            self.link.closest_preceding_finger(node, target).await
        }
    }

    /// Replace a candidate that failed at transport level by the next untried entry after
    /// it in the local successor list.
    fn substitute(
        &self,
        failed: &RemoteNode,
        tried: &mut HashSet<Did>,
        target: Did,
    ) -> Result<RemoteNode> {
        tried.insert(failed.did);
        self.ring.evict_finger(failed.did)?;
        let mut candidates = self.ring.successors()?;
        candidates.retain(|s| !tried.contains(&s.did));
        candidates.sort_by_key(|s| failed.did.distance(s.did));
        let next = candidates
            .into_iter()
            .next()
            .ok_or(Error::RoutingExhausted(target))?;
        tracing::debug!(
            "lookup {}: {} failed, fall back to {}",
            target,
            failed,
            next
        );
        Ok(next)
    }

    /// Continue a walk whose candidate `failed` at transport level after being reached
    /// through `previous`. Returns the next candidate and, when known, its successor.
    ///
    /// Our successor list only stands in for the successors of this node. A remote
    /// `previous` hop knows the nodes following `failed`, so it resolves the rest of the
    /// walk itself; when it cannot, the walk restarts from the local substitute.
    async fn recover(
        &self,
        failed: &RemoteNode,
        previous: Option<RemoteNode>,
        tried: &mut HashSet<Did>,
        target: Did,
    ) -> Result<(RemoteNode, Option<RemoteNode>)> {
        tried.insert(failed.did);
        self.ring.evict_finger(failed.did)?;
        let previous = match previous {
            Some(p) if p == *self.node() => {
                let substitute = self.substitute(failed, tried, target)?;
                return Ok((p, Some(substitute)));
            }
            Some(p) => p,
            None => return Ok((self.substitute(failed, tried, target)?, None)),
        };
        let delegated = async {
            let pred = self.link.find_predecessor(&previous, target).await?;
            let owner = self.link.find_successor(&previous, target).await?;
            Ok::<_, Error>((pred, owner))
        };
        match delegated.await {
            Ok((pred, owner)) if !tried.contains(&pred.did) && !tried.contains(&owner.did) => {
                tracing::debug!(
                    "lookup {}: {} failed, {} resolved ({}, {}]",
                    target,
                    failed,
                    previous,
                    pred,
                    owner
                );
                Ok((pred, Some(owner)))
            }
            Ok(_) => Ok((self.substitute(failed, tried, target)?, None)),
            Err(e) => {
                tracing::debug!("lookup {}: {} cannot resolve: {}", target, previous, e);
                if e.is_transport() {
                    tried.insert(previous.did);
                    self.ring.evict_finger(previous.did)?;
                }
                Ok((self.substitute(failed, tried, target)?, None))
            }
        }
    }

    /// Walk towards `target` until it lies in `(candidate, candidate.successor]`, returning
    /// that pair.
    ///
    /// A candidate failing at transport level is routed around by [Self::recover].
    /// Running out of successor-list entries is the only way routing fails.
    async fn lookup(&self, target: Did) -> Result<(RemoteNode, RemoteNode)> {
        let me = self.node().clone();
        if self.ring.is_alone()? {
            return Ok((me.clone(), me));
        }
        let pred = self.ring.predecessor()?;
        if pred != me && target.in_right_closed(pred.did, me.did) {
            return Ok((pred, me));
        }

        let max_hops = self.ring.config.max_lookup_hops;
        let mut tried = HashSet::new();
        let mut hops = 0;
        let mut previous: Option<RemoteNode> = None;
        let mut candidate = me.clone();
        let mut candidate_succ = Some(self.ring.successor()?);

        loop {
            if hops >= max_hops {
                tracing::warn!(
                    "lookup {} stopped after {} hops at {}",
                    target,
                    hops,
                    candidate
                );
                let succ = match candidate_succ.take() {
                    Some(s) => s,
                    None => self.successor_of(&candidate).await.map_err(|e| {
                        if e.is_transport() {
                            Error::RoutingExhausted(target)
                        } else {
                            e
                        }
                    })?,
                };
                return Ok((candidate, succ));
            }
            hops += 1;

            let step = match candidate_succ.take() {
                Some(succ) => Ok(succ),
                None => self.successor_of(&candidate).await,
            };
            let succ = match step {
                Ok(succ) => succ,
                Err(e) if e.is_transport() => {
                    let failed = candidate.clone();
                    (candidate, candidate_succ) = self
                        .recover(&failed, previous.take(), &mut tried, target)
                        .await?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if target.in_right_closed(candidate.did, succ.did) {
                return Ok((candidate, succ));
            }

            let next = match self.closest_preceding_of(&candidate, target).await {
                Ok(n) if tried.contains(&n.did) => self.substitute(&n, &mut tried, target)?,
                Ok(n) => n,
                Err(e) if e.is_transport() => {
                    let failed = candidate.clone();
                    (candidate, candidate_succ) = self
                        .recover(&failed, previous.take(), &mut tried, target)
                        .await?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if next == candidate {
                // the candidate knows nobody closer, its successor is the best answer
                return Ok((candidate, succ));
            }
            previous = Some(candidate);
            candidate = next;
        }
    }
}
