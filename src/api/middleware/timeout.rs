//! Per-request time limit taken from `server.request_timeout`.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

pub async fn request_timeout_middleware(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(limit_secs = limit.as_secs(), "Request timed out");
            (StatusCode::REQUEST_TIMEOUT, "Tempo di risposta superato").into_response()
        }
    }
}
