//! Error of chord-core

use crate::consts::KEY_NOT_FOUND_CODE;
use crate::dht::Did;

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collections in chord-core.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The peer could not be dialed or the connection broke.
    #[error("Peer {address} is unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    /// The peer did not answer in time.
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// The peer answered with an application error.
    #[error("Remote fault {code}: {message}")]
    RemoteFault { code: i64, message: String },

    /// Every fallback candidate of a lookup failed.
    #[error("Routing exhausted while looking up {0}")]
    RoutingExhausted(Did),

    #[error("Finger index {0} out of range")]
    InvalidFingerIndex(usize),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed on acquiring ring state lock")]
    RingLockPoisoned,

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Invalid identifier: {0}")]
    InvalidDid(String),
}

impl Error {
    /// Transport failures are recovered locally by routing and stabilization.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Unreachable { .. } | Error::Timeout(_))
    }

    /// True for a missing key, whether it was reported locally or by the owner.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::KeyNotFound(_) => true,
            Error::RemoteFault { code, .. } => *code == KEY_NOT_FOUND_CODE,
            _ => false,
        }
    }
}
