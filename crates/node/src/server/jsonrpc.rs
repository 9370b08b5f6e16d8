//! Dispatch of ring JSON-RPC calls onto a [ChordNode].
use std::sync::Arc;

use chord_core::consts::INIT_TOKEN;
use chord_core::node::ChordNode;
use chord_rpc::method::Method;
use chord_rpc::types::*;
use jsonrpc_core::Params;
use jsonrpc_core::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

/// Handles every method of the ring RPC surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct RingRpcHandler;

pub(crate) struct RingRpcMiddleware;

fn parse<T: DeserializeOwned>(params: Params) -> Result<T> {
    params
        .parse::<T>()
        .map_err(|e| Error::InvalidParams(e.message))
}

fn respond<T: Serialize>(result: T) -> Result<Value> {
    Ok(serde_json::to_value(result)?)
}

fn ack() -> Result<Value> {
    respond(Ack {})
}

impl RingRpcHandler {
    pub async fn handle_request(
        self,
        node: Arc<ChordNode>,
        method: String,
        params: Params,
    ) -> jsonrpc_core::Result<Value> {
        let method = Method::try_from(method.as_str()).map_err(Error::from)?;
        tracing::trace!("{} handles {}", node.node(), method);
        self.dispatch(&node, method, params).await.map_err(|e| {
            tracing::debug!("{} failed: {}", method, e);
            e.into()
        })
    }

    async fn dispatch(self, node: &ChordNode, method: Method, params: Params) -> Result<Value> {
        match method {
            Method::FindSuccessor => {
                let req: TargetRequest = parse(params)?;
                respond(node.find_successor(req.target).await?)
            }
            Method::FindPredecessor => {
                let req: TargetRequest = parse(params)?;
                respond(node.find_predecessor(req.target).await?)
            }
            Method::GetSuccessor => respond(node.ring.successor()?),
            Method::GetPredecessor => respond(node.ring.predecessor()?),
            Method::ClosestPrecedingFinger => {
                let req: TargetRequest = parse(params)?;
                respond(node.closest_preceding_finger(req.target)?)
            }
            Method::Notify => {
                let req: NodeRequest = parse(params)?;
                node.notify(req.node).await?;
                ack()
            }
            Method::UpdatePredecessor => {
                let req: NodeRequest = parse(params)?;
                node.update_predecessor(req.node)?;
                ack()
            }
            Method::UpdateSuccessor => {
                let req: NodeRequest = parse(params)?;
                node.update_successor(req.node)?;
                ack()
            }
            Method::UpdateFingerTable => {
                let req: FingerUpdateRequest = parse(params)?;
                node.update_finger_table(req.node, req.index).await?;
                ack()
            }
            Method::GetKeysInInterval => {
                let req: IntervalRequest = parse(params)?;
                let pairs: IntervalResponse = node.export_keys(req.lower, req.upper).await?;
                respond(pairs)
            }
            Method::PutRemote => {
                let req: KeyValue = parse(params)?;
                node.put_local(&req.key, &req.value).await?;
                ack()
            }
            Method::GetRemote => {
                let req: KeyRequest = parse(params)?;
                let value = node.get_local(&req.key).await?;
                respond(KeyValue {
                    key: req.key,
                    value,
                })
            }
            Method::Init => {
                let req: InitMessage = parse(params)?;
                if req.token != INIT_TOKEN {
                    tracing::warn!("unexpected handshake token {:?}", req.token);
                }
                respond(req)
            }
            Method::Leave => {
                node.leave().await?;
                ack()
            }
            _ => Err(Error::InvalidMethod),
        }
    }
}

mod jsonrpc_middleware_impl {
    use std::future::Future;

    use jsonrpc_core::futures_util::future;
    use jsonrpc_core::futures_util::future::Either;
    use jsonrpc_core::futures_util::FutureExt;
    use jsonrpc_core::middleware::NoopCallFuture;
    use jsonrpc_core::middleware::NoopFuture;
    use jsonrpc_core::*;

    use super::*;

    impl Middleware<Arc<ChordNode>> for RingRpcMiddleware {
        type Future = NoopFuture;
        type CallFuture = NoopCallFuture;

        fn on_call<F, X>(
            &self,
            call: Call,
            meta: Arc<ChordNode>,
            next: F,
        ) -> Either<Self::CallFuture, X>
        where
            F: Fn(Call, Arc<ChordNode>) -> X + Send + Sync,
            X: Future<Output = Option<Output>> + Send + 'static,
        {
            match call {
                Call::MethodCall(req) => {
                    let fut = RingRpcHandler
                        .handle_request(meta, req.method, req.params)
                        .then(move |res| {
                            future::ready(Some(Output::from(res, req.id, req.jsonrpc)))
                        });
                    Either::Left(Box::pin(fut))
                }
                _ => Either::Left(Box::pin(next(call, meta))),
            }
        }
    }
}
