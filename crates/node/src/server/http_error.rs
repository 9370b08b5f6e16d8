use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;

#[derive(Debug)]
pub enum HttpError {
    BadRequest,
    NotFound,
    Internal,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (code, msg) = match self {
            HttpError::BadRequest => (StatusCode::BAD_REQUEST, "Bad Request"),
            HttpError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            HttpError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };

        (code, msg).into_response()
    }
}

impl From<chord_core::error::Error> for HttpError {
    fn from(e: chord_core::error::Error) -> Self {
        if e.is_not_found() {
            HttpError::NotFound
        } else {
            tracing::warn!("request failed: {}", e);
            HttpError::Internal
        }
    }
}

