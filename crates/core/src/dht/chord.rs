//! Ring state of one participant.
#![warn(missing_docs)]
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use super::finger::FingerTable;
use super::successor::SuccessorSeq;
use super::types::RemoteNode;
use super::types::RingConfig;
use super::types::TopoInfo;
use crate::dht::Did;
use crate::error::Error;
use crate::error::Result;

/// Mutable part of [PeerRing], always accessed under one lock.
#[derive(Clone, Debug)]
struct RingState {
    predecessor: RemoteNode,
    successors: SuccessorSeq,
    finger: FingerTable,
}

impl RingState {
    /// Slot 0 of the finger table mirrors the head of the successor list.
    fn sync_head(&mut self, me: &RemoteNode) -> Result<()> {
        let head = self.successors.head().cloned().unwrap_or_else(|| me.clone());
        self.finger.set(0, head)
    }
}

/// PeerRing is one node's view of the ring: its identity, its predecessor, an ordered
/// successor list and a finger table.
///
/// All routing fields live behind a single reader/writer lock. Every method takes the lock
/// for the duration of one read or one update and returns owned values, so callers never
/// hold it across a remote call. Lookups take the read side; set-predecessor,
/// set-successor, splicing the successor list and finger fixes take the write side.
///
/// The node is alone on the ring exactly when its successor list is empty. In that state
/// [PeerRing::successor] answers the node itself.
#[derive(Debug)]
pub struct PeerRing {
    /// The current node.
    pub node: RemoteNode,
    /// Tunables.
    pub config: RingConfig,
    state: RwLock<RingState>,
}

impl PeerRing {
    /// Create a ring of one: predecessor is self, successor list is empty and every finger
    /// points at self.
    pub fn new(node: RemoteNode, config: RingConfig) -> Self {
        let state = RingState {
            predecessor: node.clone(),
            successors: SuccessorSeq::new(node.did, config.successor_list_size),
            finger: FingerTable::new(node.clone(), Did::BITS),
        };
        Self {
            node,
            config,
            state: RwLock::new(state),
        }
    }

    /// Did of current node.
    pub fn did(&self) -> Did {
        self.node.did
    }

    fn read(&self) -> Result<RwLockReadGuard<RingState>> {
        self.state.read().map_err(|_| Error::RingLockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<RingState>> {
        self.state.write().map_err(|_| Error::RingLockPoisoned)
    }

    /// Whether the node is the only member it knows about.
    pub fn is_alone(&self) -> Result<bool> {
        Ok(self.read()?.successors.is_empty())
    }

    /// Current predecessor, self if unknown.
    pub fn predecessor(&self) -> Result<RemoteNode> {
        Ok(self.read()?.predecessor.clone())
    }

    /// Head of the successor list, self if alone.
    pub fn successor(&self) -> Result<RemoteNode> {
        let state = self.read()?;
        Ok(state
            .successors
            .head()
            .cloned()
            .unwrap_or_else(|| self.node.clone()))
    }

    /// Snapshot of the successor list.
    pub fn successors(&self) -> Result<Vec<RemoteNode>> {
        Ok(self.read()?.successors.list().to_vec())
    }

    /// Snapshot of the finger table.
    pub fn finger_table(&self) -> Result<FingerTable> {
        Ok(self.read()?.finger.clone())
    }

    /// Start identifier of finger slot `index`.
    pub fn finger_start(&self, index: usize) -> Result<Did> {
        self.read()?.finger.start(index)
    }

    /// Neighborhood of current node.
    pub fn topo_info(&self) -> Result<TopoInfo> {
        let state = self.read()?;
        Ok(TopoInfo {
            successors: state.successors.list().to_vec(),
            predecessor: state.predecessor.clone(),
        })
    }

    /// Whether `target` falls in this node's partition `(predecessor, self]`.
    /// A node that is alone owns everything; a node that has not learned its predecessor
    /// yet only owns its own id.
    pub fn owns(&self, target: Did) -> Result<bool> {
        let state = self.read()?;
        if state.successors.is_empty() || target == self.node.did {
            return Ok(true);
        }
        let pred = state.predecessor.did;
        Ok(pred != self.node.did && target.in_right_closed(pred, self.node.did))
    }

    /// Fall back to the ring-of-one state.
    pub fn init_alone(&self) -> Result<()> {
        let mut state = self.write()?;
        state.predecessor = self.node.clone();
        state.successors.clear();
        state.finger.reset();
        tracing::info!("{} is alone on the ring", self.node);
        Ok(())
    }

    /// Overwrite the predecessor.
    pub fn set_predecessor(&self, node: RemoteNode) -> Result<()> {
        let mut state = self.write()?;
        if state.predecessor != node {
            tracing::debug!("{} set predecessor {}", self.node.did, node);
        }
        state.predecessor = node;
        Ok(())
    }

    /// Overwrite the successor. Entries between self and `node` are dropped from the
    /// successor list. Setting self means being alone.
    pub fn set_successor(&self, node: RemoteNode) -> Result<()> {
        let mut state = self.write()?;
        tracing::debug!("{} set successor {}", self.node.did, node);
        state.successors.set_head(node.clone());
        state.finger.learn(&node);
        state.sync_head(&self.node)
    }

    /// Drop the head of the successor list and every finger pointing at it.
    /// Returns the dropped node.
    pub fn skip_successor(&self) -> Result<Option<RemoteNode>> {
        let mut state = self.write()?;
        let skipped = state.successors.skip_head();
        if let Some(s) = &skipped {
            tracing::info!("{} skip successor {}", self.node.did, s);
            state.finger.remove(s.did);
        }
        state.sync_head(&self.node)?;
        Ok(skipped)
    }

    /// `anchor` reported `next` as its successor, repair the list accordingly.
    pub fn splice_successor_list(&self, anchor: Did, next: RemoteNode) -> Result<()> {
        let mut state = self.write()?;
        state.successors.splice(anchor, next.clone());
        state.finger.learn(&next);
        state.sync_head(&self.node)
    }

    /// Remove an unreachable node from the successor list.
    pub fn remove_successor(&self, did: Did) -> Result<bool> {
        let mut state = self.write()?;
        let removed = state.successors.remove(did);
        state.finger.remove(did);
        state.sync_head(&self.node)?;
        Ok(removed)
    }

    /// Forget a node in the finger table only.
    pub fn evict_finger(&self, did: Did) -> Result<()> {
        let mut state = self.write()?;
        state.finger.remove(did);
        state.sync_head(&self.node)
    }

    /// Insert a node into the successor list at its ring position.
    pub fn update_successors(&self, node: RemoteNode) -> Result<bool> {
        if node.did == self.node.did {
            return Ok(false);
        }
        let mut state = self.write()?;
        let added = state.successors.update(node.clone());
        state.finger.learn(&node);
        state.sync_head(&self.node)?;
        Ok(added)
    }

    /// Like [Self::update_successors], but only for a node within the span the list already
    /// covers, `(self, tail]`. Nodes past the tail are reached by the list repair.
    pub fn update_adjacent_successor(&self, node: RemoteNode) -> Result<bool> {
        if node.did == self.node.did {
            return Ok(false);
        }
        let mut state = self.write()?;
        if let Some(tail) = state.successors.list().last() {
            if !node.did.in_right_closed(self.node.did, tail.did) {
                return Ok(false);
            }
        }
        let added = state.successors.update(node.clone());
        state.finger.learn(&node);
        state.sync_head(&self.node)?;
        Ok(added)
    }

    /// Set finger slot `index`. Slot 0 goes through the successor list.
    pub fn set_finger(&self, index: usize, node: RemoteNode) -> Result<()> {
        if index == 0 {
            return self.update_successors(node).map(|_| ());
        }
        self.write()?.finger.set(index, node)
    }

    /// Set finger slot `index` if `node` is a closer successor of its start than the
    /// current entry, i.e. `node <- [start, current)`. Returns whether the slot changed.
    pub fn update_finger(&self, index: usize, node: RemoteNode) -> Result<bool> {
        if node.did == self.node.did {
            return Ok(false);
        }
        let mut state = self.write()?;
        let entry = state.finger.get(index)?;
        if entry.node.did == entry.start || entry.node == node {
            return Ok(false);
        }
        if !node.did.in_left_closed(entry.start, entry.node.did) {
            return Ok(false);
        }
        if index == 0 {
            state.successors.update(node);
            state.sync_head(&self.node)?;
        } else {
            state.finger.set(index, node)?;
        }
        Ok(true)
    }

    /// The known node that most closely precedes `target`: the highest finger strictly
    /// inside `(self, target)`, or a successor list entry if one is closer. Self if none.
    pub fn closest_preceding_finger(&self, target: Did) -> Result<RemoteNode> {
        let state = self.read()?;
        let me = self.node.did;
        let from_finger = state.finger.closest_preceding(target);
        let from_successors = state
            .successors
            .list()
            .iter()
            .rev()
            .find(|s| s.did.in_open(me, target))
            .cloned();
        let best = match (from_finger, from_successors) {
            (Some(f), Some(s)) => {
                if s.did.distance(target) < f.did.distance(target) {
                    s
                } else {
                    f
                }
            }
            (Some(f), None) => f,
            (None, Some(s)) => s,
            (None, None) => self.node.clone(),
        };
        Ok(best)
    }

    /// Returns the current predecessor when accepting `candidate` depends on whether that
    /// predecessor is still alive.
    pub fn notify_probe(&self, candidate: &RemoteNode) -> Result<Option<RemoteNode>> {
        let state = self.read()?;
        let pred = &state.predecessor;
        if *candidate == self.node
            || candidate == pred
            || *pred == self.node
            || candidate.did.in_open(pred.did, self.node.did)
        {
            return Ok(None);
        }
        Ok(Some(pred.clone()))
    }

    /// `candidate` thinks it might be our predecessor.
    ///
    /// It is accepted if we have no predecessor, if it lies in `(predecessor, self)`, or if
    /// `dead` is the current predecessor (the caller has found it unresponsive). A node that
    /// is alone also takes the candidate as successor. Returns whether the predecessor
    /// changed.
    pub fn notify(&self, candidate: RemoteNode, dead: Option<&RemoteNode>) -> Result<bool> {
        if candidate == self.node {
            return Ok(false);
        }
        let mut state = self.write()?;
        if state.successors.is_empty() {
            state.successors.set_head(candidate.clone());
            state.sync_head(&self.node)?;
        }
        state.finger.learn(&candidate);

        let pred = state.predecessor.clone();
        if pred == candidate {
            return Ok(false);
        }
        let accept = pred == self.node
            || candidate.did.in_open(pred.did, self.node.did)
            || dead.map(|d| *d == pred).unwrap_or(false);
        if accept {
            tracing::debug!("{} accept predecessor {}", self.node.did, candidate);
            state.predecessor = candidate;
        }
        Ok(accept)
    }
}
