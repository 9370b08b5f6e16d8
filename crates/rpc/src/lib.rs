//! chord-rpc
//! ===============
//!
//! The ring protocol spoken over JSON-RPC 2.0 on HTTP POST.
//!
//! [method::Method] names every remote operation, [types] holds their parameters and
//! results, [jsonrpc::Client] talks to one endpoint, and [remote::HttpRemote] keeps one
//! client per peer address and implements [chord_core::remote::RemoteLink].

pub mod error;
pub mod jsonrpc;
pub mod method;
pub mod remote;
pub mod types;

pub use remote::ClientConfig;
pub use remote::HttpRemote;
