//! chord-rpc client

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chord_core::dht::RemoteNode;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::method::Method;
use crate::types::*;

/// Wrap json_client send request between ring nodes.
pub struct Client {
    client: HttpClient,
    endpoint_url: String,
    next_id: AtomicU64,
}

/// The errors returned by the client.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// An error returned by the server.
    #[error("Server returned rpc error {0}")]
    JsonClientError(jsonrpc_core::Error),
    /// Failure to parse server response.
    #[error("Failed to parse server response as {0}: {1}")]
    ParseError(String, Box<dyn std::error::Error + Send + Sync>),
    /// Request timed out.
    #[error("Request timed out")]
    Timeout,
    /// The endpoint could not be dialed or dropped the connection.
    #[error("Connection failed: {0}")]
    Connect(String),
    /// A general client error.
    #[error("Client error: {0}")]
    Client(String),
}

/// A wrap `Result` contains ClientError.
type Result<T> = std::result::Result<T, RpcError>;

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RpcError::Timeout
        } else if e.is_connect() || e.is_request() {
            RpcError::Connect(e.to_string())
        } else {
            RpcError::Client(e.to_string())
        }
    }
}

impl Client {
    /// Creates a new Client instance with the specified endpoint URL
    pub fn new(endpoint_url: &str) -> Self {
        Self {
            client: HttpClient::default(),
            endpoint_url: endpoint_url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a client whose every request gives up after `timeout`.
    pub fn new_with_timeout(endpoint_url: &str, timeout: Duration) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoint_url: endpoint_url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub async fn call_method<T>(&self, method: Method, req: &impl Serialize) -> Result<T>
    where T: DeserializeOwned {
        use jsonrpc_core::*;

        let params = serde_json::to_value(req)
            .map_err(|e| RpcError::Client(e.to_string()))?
            .as_object()
            .ok_or(RpcError::Client("params should be an object".to_string()))?
            .clone();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let jsonrpc_request = Request::Single(Call::MethodCall(MethodCall {
            jsonrpc: Some(Version::V2),
            method: method.to_string(),
            params: Params::Map(params),
            id: Id::Num(id),
        }));

        let result = self.do_jsonrpc_request(&jsonrpc_request, id).await?;
        serde_json::from_value(result).map_err(|e| RpcError::ParseError(e.to_string(), Box::new(e)))
    }

    async fn do_jsonrpc_request(
        &self,
        req: &jsonrpc_core::Request,
        id: u64,
    ) -> Result<serde_json::Value> {
        let body = serde_json::to_string(req).map_err(|e| RpcError::Client(e.to_string()))?;

        let resp = self
            .client
            .post(self.endpoint_url.as_str())
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let jsonrpc_resp = jsonrpc_core::Response::from_json(&String::from_utf8_lossy(&resp))
            .map_err(|e| RpcError::ParseError(e.to_string(), Box::new(e)))?;

        let output = match jsonrpc_resp {
            jsonrpc_core::Response::Single(output) => output,
            jsonrpc_core::Response::Batch(_) => {
                return Err(RpcError::Client(
                    "Batch response is not supported".to_string(),
                ))
            }
        };
        if output.id() != &jsonrpc_core::Id::Num(id) {
            return Err(RpcError::Client(format!(
                "response id {:?} does not match request id {}",
                output.id(),
                id
            )));
        }
        match output {
            jsonrpc_core::Output::Success(success) => Ok(success.result),
            jsonrpc_core::Output::Failure(failure) => Err(RpcError::JsonClientError(failure.error)),
        }
    }

    /// Resolve the owner of `target` on the remote side.
    pub async fn find_successor(&self, req: &TargetRequest) -> Result<RemoteNode> {
        self.call_method(Method::FindSuccessor, req).await
    }

    pub async fn find_predecessor(&self, req: &TargetRequest) -> Result<RemoteNode> {
        self.call_method(Method::FindPredecessor, req).await
    }

    pub async fn get_successor(&self) -> Result<RemoteNode> {
        self.call_method(Method::GetSuccessor, &Ack {}).await
    }

    pub async fn get_predecessor(&self) -> Result<RemoteNode> {
        self.call_method(Method::GetPredecessor, &Ack {}).await
    }

    pub async fn closest_preceding_finger(&self, req: &TargetRequest) -> Result<RemoteNode> {
        self.call_method(Method::ClosestPrecedingFinger, req).await
    }

    pub async fn notify(&self, req: &NodeRequest) -> Result<Ack> {
        self.call_method(Method::Notify, req).await
    }

    pub async fn update_predecessor(&self, req: &NodeRequest) -> Result<Ack> {
        self.call_method(Method::UpdatePredecessor, req).await
    }

    pub async fn update_successor(&self, req: &NodeRequest) -> Result<Ack> {
        self.call_method(Method::UpdateSuccessor, req).await
    }

    pub async fn update_finger_table(&self, req: &FingerUpdateRequest) -> Result<Ack> {
        self.call_method(Method::UpdateFingerTable, req).await
    }

    /// Move the remote pairs of `(lower, upper]` to the caller.
    pub async fn get_keys_in_interval(
        &self,
        req: &IntervalRequest,
    ) -> Result<HashMap<String, String>> {
        self.call_method(Method::GetKeysInInterval, req).await
    }

    pub async fn put_remote(&self, req: &KeyValue) -> Result<Ack> {
        self.call_method(Method::PutRemote, req).await
    }

    pub async fn get_remote(&self, req: &KeyRequest) -> Result<KeyValue> {
        self.call_method(Method::GetRemote, req).await
    }

    /// Handshake, the remote echoes the token.
    pub async fn init(&self, req: &InitMessage) -> Result<InitMessage> {
        self.call_method(Method::Init, req).await
    }

    /// Ask the remote node to leave the ring.
    pub async fn leave(&self) -> Result<Ack> {
        self.call_method(Method::Leave, &Ack {}).await
    }
}
