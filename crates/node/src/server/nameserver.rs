//! The membership nameserver: an ordered set of advertised node addresses.
use std::sync::Arc;
use std::sync::RwLock;

use axum::extract::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use super::http_error::HttpError;

#[derive(Debug, Default)]
pub struct Nameserver {
    members: RwLock<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MemberForm {
    pub ip: String,
}

impl Nameserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered addresses in registration order.
    pub fn members(&self) -> Result<Vec<String>, HttpError> {
        Ok(self.members.read().map_err(|_| HttpError::Internal)?.clone())
    }

    /// Returns false if `address` was already registered.
    pub fn register(&self, address: &str) -> Result<bool, HttpError> {
        let mut members = self.members.write().map_err(|_| HttpError::Internal)?;
        if members.iter().any(|m| m == address) {
            return Ok(false);
        }
        members.push(address.to_string());
        Ok(true)
    }

    /// Returns false if `address` was not registered.
    pub fn unregister(&self, address: &str) -> Result<bool, HttpError> {
        let mut members = self.members.write().map_err(|_| HttpError::Internal)?;
        let before = members.len();
        members.retain(|m| m != address);
        Ok(members.len() != before)
    }
}

pub fn router(state: Arc<Nameserver>) -> Router {
    Router::new()
        .route("/", get(list_handler).put(register_handler))
        .route("/unregister", post(unregister_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn list_handler(
    State(state): State<Arc<Nameserver>>,
) -> Result<Json<Vec<String>>, HttpError> {
    Ok(Json(state.members()?))
}

async fn register_handler(
    State(state): State<Arc<Nameserver>>,
    Form(form): Form<MemberForm>,
) -> Result<StatusCode, HttpError> {
    if form.ip.is_empty() {
        return Err(HttpError::BadRequest);
    }
    if state.register(&form.ip)? {
        tracing::info!("{} registered", form.ip);
    }
    Ok(StatusCode::OK)
}

async fn unregister_handler(
    State(state): State<Arc<Nameserver>>,
    Form(form): Form<MemberForm>,
) -> Result<StatusCode, HttpError> {
    if state.unregister(&form.ip)? {
        tracing::info!("{} unregistered", form.ip);
    }
    Ok(StatusCode::OK)
}
