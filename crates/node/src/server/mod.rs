//! Network surfaces of a node: the ring JSON-RPC server, the key/value front end and
//! the membership nameserver.
mod http_error;
mod jsonrpc;
pub mod nameserver;

use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use chord_core::inspect::RingInspect;
use chord_core::node::ChordNode;
use jsonrpc_core::MetaIoHandler;
use tower_http::cors::CorsLayer;

use self::http_error::HttpError;
pub use self::jsonrpc::RingRpcHandler;
use self::jsonrpc::RingRpcMiddleware;
use self::nameserver::Nameserver;

/// JSON-RPC state
#[derive(Clone)]
pub struct JsonRpcState<M>
where M: jsonrpc_core::Middleware<Arc<ChordNode>>
{
    node: Arc<ChordNode>,
    io_handler: MetaIoHandler<Arc<ChordNode>, M>,
}

/// Key/value front end state
#[derive(Clone)]
pub struct FrontendState {
    node: Arc<ChordNode>,
}

/// Router of the ring JSON-RPC surface, served on `POST /`.
pub fn ring_rpc_router(node: Arc<ChordNode>) -> Router {
    let jsonrpc_state = Arc::new(JsonRpcState {
        node,
        io_handler: MetaIoHandler::with_middleware(RingRpcMiddleware),
    });
    Router::new()
        .route("/", post(jsonrpc_io_handler).with_state(jsonrpc_state))
        .layer(axum::middleware::from_fn(version_header))
}

/// Router of the client-facing key/value front end.
pub fn frontend_router(node: Arc<ChordNode>) -> Router {
    let state = Arc::new(FrontendState { node });
    Router::new()
        .route("/state", get(state_handler))
        .route("/:key", get(get_handler).put(put_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(version_header))
}

/// Serve `router` on `listener` until `shutdown` resolves. In-flight requests are
/// answered before returning.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    hyper::Server::from_tcp(listener)?
        .serve(router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Run a nameserver on `listener` until `shutdown` resolves.
pub async fn run_nameserver(
    listener: TcpListener,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("nameserver listening on http://{}", addr);
    serve(listener, nameserver::router(Arc::new(Nameserver::new())), shutdown).await
}

async fn jsonrpc_io_handler<M>(
    State(state): State<Arc<JsonRpcState<M>>>,
    body: String,
) -> Result<JsonResponse, HttpError>
where
    M: jsonrpc_core::Middleware<Arc<ChordNode>>,
{
    let r = state
        .io_handler
        .handle_request(&body, state.node.clone())
        .await
        .ok_or(HttpError::BadRequest)?;
    Ok(JsonResponse(r))
}

async fn version_header<B>(
    req: axum::http::Request<B>,
    next: axum::middleware::Next<B>,
) -> axum::response::Response {
    let mut res = next.run(req).await;
    if let Ok(version) = axum::http::HeaderValue::from_str(crate::util::build_version().as_str()) {
        res.headers_mut().insert("X-NODE-VERSION", version);
    }
    res
}

async fn state_handler(
    State(state): State<Arc<FrontendState>>,
) -> Result<axum::Json<RingInspect>, HttpError> {
    Ok(axum::Json(state.node.inspect().await?))
}

async fn get_handler(
    State(state): State<Arc<FrontendState>>,
    Path(key): Path<String>,
) -> Result<String, HttpError> {
    Ok(state.node.get(&key).await?)
}

async fn put_handler(
    State(state): State<Arc<FrontendState>>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode, HttpError> {
    let value = String::from_utf8(body.to_vec()).map_err(|_| HttpError::BadRequest)?;
    state.node.put(&key, &value).await?;
    Ok(StatusCode::OK)
}

/// JSON response struct
#[derive(Debug, Clone)]
pub struct JsonResponse(String);

impl IntoResponse for JsonResponse {
    fn into_response(self) -> axum::response::Response {
        ([("content-type", "application/json")], self.0).into_response()
    }
}
