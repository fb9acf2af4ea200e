//! Health check endpoint.

use axum::http::StatusCode;

/// GET /livez - Basic liveness check.
///
/// Returns 200 immediately, without touching the database or the cache.
pub async fn livez() -> StatusCode {
    StatusCode::OK
}
