//! Parameters and results of the ring methods.
//!
//! Every request is sent as a JSON object of named parameters. Operations without a
//! meaningful result answer with [Ack].
use std::collections::HashMap;

use chord_core::dht::Did;
use chord_core::dht::RemoteNode;
use serde::Deserialize;
use serde::Serialize;

/// Empty object, used both as the parameter of argument-less methods and as an ack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequest {
    pub target: Did,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRequest {
    pub node: RemoteNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerUpdateRequest {
    pub node: RemoteNode,
    pub index: usize,
}

/// Half-open interval `(lower, upper]` of key ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRequest {
    pub lower: Did,
    pub upper: Did,
}

/// Pairs moved out of an interval, keyed by the original key.
pub type IntervalResponse = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRequest {
    pub key: String,
}

/// Handshake, the callee echoes the token it was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitMessage {
    pub token: String,
}
