//! chord-node
//! ===============
//!
//! A runnable chord ring node. [processor::Processor] ties a [chord_core::node::ChordNode]
//! to the ring JSON-RPC server and the key/value front end in [server], discovers peers
//! through a nameserver with [directory::DirectoryClient], and is configured by
//! [config::Config].

pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod processor;
pub mod server;
pub mod util;

#[cfg(test)]
mod tests;
