#![warn(missing_docs)]
//! Implementation of the ring DHT
//! which is based on CHORD, ref: <https://pdos.csail.mit.edu/papers/ton:chord/paper-ton.pdf>
//! With high probability, the number of nodes that must be contacted to find a successor in an N-node network is O(log N).

mod chord;
pub mod did;
/// Finger table of a ring participant
pub mod finger;
mod stabilization;
/// Successor list of a ring participant
pub mod successor;
pub mod types;

pub use chord::PeerRing;
pub use did::hash_of;
pub use did::Did;
pub use finger::FingerTable;
pub use stabilization::Stabilizer;
pub use successor::SuccessorSeq;
pub use types::FingerEntry;
pub use types::RemoteNode;
pub use types::RingConfig;
pub use types::TopoInfo;
