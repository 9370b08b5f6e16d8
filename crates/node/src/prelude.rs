//! Re-exports of the crates a node is built on.
pub use chord_core;
pub use chord_core::prelude::*;
pub use chord_rpc;

pub use crate::config::Config;
pub use crate::processor::Processor;
pub use crate::processor::ProcessorBuilder;
