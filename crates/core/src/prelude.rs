//! Re-exports of the types most callers need.

pub use async_trait::async_trait;

pub use crate::dht::Did;
pub use crate::dht::PeerRing;
pub use crate::dht::RemoteNode;
pub use crate::dht::RingConfig;
pub use crate::dht::Stabilizer;
pub use crate::node::ChordNode;
pub use crate::remote::Directory;
pub use crate::remote::RemoteLink;
pub use crate::storage::ObjectStore;
