//! Constant variables.

/// Number of successors kept for fault tolerance.
pub const DEFAULT_SUCCESSOR_LIST_SIZE: usize = 3;
/// Upper bound of hops taken by a single lookup. Twice the identifier width.
pub const DEFAULT_MAX_LOOKUP_HOPS: usize = 320;
/// Seconds between two stabilization cycles.
pub const DEFAULT_STABILIZE_INTERVAL_SECS: u64 = 1;
/// Token echoed by a peer during the connection handshake.
pub const INIT_TOKEN: &str = "init";

/// JSON-RPC server error code for a missing key.
pub const KEY_NOT_FOUND_CODE: i64 = -32004;
/// JSON-RPC server error code for a lookup that ran out of candidates.
pub const ROUTING_EXHAUSTED_CODE: i64 = -32010;
/// JSON-RPC server error code for any other ring failure.
pub const RING_ERROR_CODE: i64 = -32000;
