//! Serializable snapshots of a node for the `/state` endpoint and for tests.
use serde::Deserialize;
use serde::Serialize;

use crate::dht::RemoteNode;
use crate::error::Result;
use crate::node::ChordNode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingInspect {
    #[serde(rename = "self")]
    pub node: RemoteNode,
    pub predecessor: RemoteNode,
    pub successor: RemoteNode,
    pub successor_list: Vec<RemoteNode>,
    /// Run-length compressed finger table: `(address, first slot, last slot)`.
    pub finger_table: Vec<(String, u64, u64)>,
    pub stored_keys: u32,
}

impl RingInspect {
    pub async fn inspect(node: &ChordNode) -> Result<Self> {
        let ring = &node.ring;
        let topo = ring.topo_info()?;
        let finger_table = {
            let table = ring.finger_table()?;
            compress_iter(table.list().iter().map(|e| e.node.address.clone()))
        };
        Ok(Self {
            node: node.node().clone(),
            predecessor: topo.predecessor,
            successor: ring.successor()?,
            successor_list: topo.successors,
            finger_table,
            stored_keys: node.store.count().await?,
        })
    }
}

/// Collapse runs of equal items into `(item, first index, last index)`.
pub fn compress_iter<T>(iter: impl Iterator<Item = T>) -> Vec<(T, u64, u64)>
where T: PartialEq {
    let mut result: Vec<(T, u64, u64)> = vec![];
    for (i, x) in iter.enumerate() {
        let i = i as u64;
        match result.last_mut() {
            Some((prev, _, end)) if *prev == x => *end = i,
            _ => result.push((x, i, i)),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_iter() {
        let v = vec!['a', 'a', 'f', 'a', 'b', 'b', 'c', 'c', 'c', 'd', 'e'];
        assert_eq!(
            vec![
                ('a', 0, 1),
                ('f', 2, 2),
                ('a', 3, 3),
                ('b', 4, 5),
                ('c', 6, 8),
                ('d', 9, 9),
                ('e', 10, 10),
            ],
            compress_iter(v.into_iter())
        );
        assert!(compress_iter(Vec::<u8>::new().into_iter()).is_empty());
    }
}
