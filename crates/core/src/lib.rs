//! chord-core
//! ===============
//!
//! The ring maintenance and routing protocol of a Chord-style distributed hash table.
//!
//! A set of peers collectively own a 160-bit key space. Each peer keeps a small view of
//! the ring (predecessor, successor list and finger table) in [dht::PeerRing], resolves
//! the owner of any identifier with O(log N) remote hops through [node::ChordNode], and
//! repairs its view periodically with the [dht::Stabilizer].
//!
//! The transport is abstracted by [remote::RemoteLink], and membership discovery by
//! [remote::Directory]; both are implemented over JSON-RPC in the `chord-rpc` and
//! `chord-node` crates.

pub mod consts;
pub mod dht;
pub mod error;
pub mod inspect;
pub mod node;
pub mod prelude;
pub mod remote;
pub mod storage;

#[cfg(test)]
pub mod tests;
