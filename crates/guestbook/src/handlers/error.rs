use std::any::Any;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use guestbook_core::ServiceError;

use super::response::Envelope;

/// HTTP view of a [`ServiceError`].
///
/// Lets handlers use `?` on service calls and extractor rejections alike.
#[derive(Debug)]
pub struct AppError(pub ServiceError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        let body: Envelope<()> = Envelope {
            code: status.as_u16(),
            message: self.0.public_message(),
            data: None,
            errors: self.0.fields().to_vec(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

fn malformed(message: String) -> AppError {
    AppError(ServiceError::BadRequest {
        message,
        fields: Vec::new(),
    })
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        malformed(rejection.body_text())
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Turns a handler panic into the 500 envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    AppError(ServiceError::Internal(format!(
        "panic: {}",
        panic_message(&*panic)
    )))
    .into_response()
}
