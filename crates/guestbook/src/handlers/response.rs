use axum::{http::StatusCode, Json};
use serde::Serialize;

use guestbook_core::FieldError;

/// Uniform response body of every `/guests` endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// Wraps `data` in a success envelope for `status`.
pub fn success<T: Serialize>(status: StatusCode, data: T) -> (StatusCode, Json<Envelope<T>>) {
    let body = Envelope {
        code: status.as_u16(),
        message: status.canonical_reason().unwrap_or_default().to_string(),
        data: Some(data),
        errors: Vec::new(),
    };
    (status, Json(body))
}
