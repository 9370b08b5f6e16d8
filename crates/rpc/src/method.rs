//! Rpc methods.
#![warn(missing_docs)]

use super::error::Error;
use super::error::Result;

/// supported methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Method {
    /// Resolve the owner of an identifier
    FindSuccessor,
    /// Resolve the node preceding an identifier
    FindPredecessor,
    /// Current successor of the callee
    GetSuccessor,
    /// Current predecessor of the callee
    GetPredecessor,
    /// One routing step towards an identifier
    ClosestPrecedingFinger,
    /// Offer the caller as predecessor
    Notify,
    /// Force the predecessor
    UpdatePredecessor,
    /// Force the successor
    UpdateSuccessor,
    /// Offer a node for a finger slot
    UpdateFingerTable,
    /// Move the pairs of an interval to the caller
    GetKeysInInterval,
    /// Store a pair on the callee
    PutRemote,
    /// Read a pair from the callee
    GetRemote,
    /// Connection handshake
    Init,
    /// Ask the callee to leave the ring
    Leave,
}

impl Method {
    /// Return method's name as `&str`
    pub fn as_str(&self) -> &str {
        match self {
            Method::FindSuccessor => "findSuccessor",
            Method::FindPredecessor => "findPredecessor",
            Method::GetSuccessor => "getSuccessor",
            Method::GetPredecessor => "getPredecessor",
            Method::ClosestPrecedingFinger => "closestPrecedingFinger",
            Method::Notify => "notify",
            Method::UpdatePredecessor => "updatePredecessor",
            Method::UpdateSuccessor => "updateSuccessor",
            Method::UpdateFingerTable => "updateFingerTable",
            Method::GetKeysInInterval => "getKeysInInterval",
            Method::PutRemote => "putRemote",
            Method::GetRemote => "getRemote",
            Method::Init => "init",
            Method::Leave => "leave",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Method {
    type Error = crate::error::Error;

    fn try_from(value: &str) -> Result<Self> {
        Ok(match value {
            "findSuccessor" => Self::FindSuccessor,
            "findPredecessor" => Self::FindPredecessor,
            "getSuccessor" => Self::GetSuccessor,
            "getPredecessor" => Self::GetPredecessor,
            "closestPrecedingFinger" => Self::ClosestPrecedingFinger,
            "notify" => Self::Notify,
            "updatePredecessor" => Self::UpdatePredecessor,
            "updateSuccessor" => Self::UpdateSuccessor,
            "updateFingerTable" => Self::UpdateFingerTable,
            "getKeysInInterval" => Self::GetKeysInInterval,
            "putRemote" => Self::PutRemote,
            "getRemote" => Self::GetRemote,
            "init" => Self::Init,
            "leave" => Self::Leave,
            _ => return Err(Error::InvalidMethod),
        })
    }
}
