//! gRPC transport.
//!
//! Implements the services generated from `proto/guest.proto` on top of the
//! same application services the HTTP handlers use.

mod guest;

use std::any::Any;

use axum::body::Body;
use tonic::{Code, Request, Status};

use guestbook_core::{RequestContext, RequestId, ServiceError, REQUEST_ID_HEADER};

pub use guest::GuestGrpc;

use crate::handlers::error::panic_message;

// Include the generated protobuf code
pub mod proto {
    tonic::include_proto!("guestbook.v1");
}

/// gRPC code for an HTTP-equivalent status.
pub fn code_for_status(status: u16) -> Code {
    match status {
        400 => Code::InvalidArgument,
        401 => Code::Unauthenticated,
        403 => Code::PermissionDenied,
        404 => Code::NotFound,
        408 => Code::DeadlineExceeded,
        409 => Code::AlreadyExists,
        429 => Code::ResourceExhausted,
        499 => Code::Cancelled,
        501 => Code::Unimplemented,
        503 => Code::Unavailable,
        504 => Code::DeadlineExceeded,
        _ => Code::Internal,
    }
}

/// Converts a service error into a `Status`.
///
/// The message is the first field error when there is one.
pub fn to_status(err: ServiceError) -> Status {
    let code = code_for_status(err.status_code());
    let message = err
        .fields()
        .first()
        .map(|field| field.message.clone())
        .unwrap_or_else(|| err.public_message());

    if code == Code::Internal {
        tracing::error!(error = %err, "gRPC request failed");
    } else {
        tracing::warn!(code = ?code, error = %err, "gRPC request rejected");
    }

    Status::new(code, message)
}

/// `Internal` status returned when a call panics.
pub fn panic_status(panic: Box<dyn Any + Send + 'static>) -> axum::http::Response<Body> {
    tracing::error!(panic = %panic_message(&*panic), "gRPC call panicked");
    Status::internal("Internal Server Error").into_http()
}

/// Builds the request context from the `x-request-id` metadata.
pub fn request_context<T>(request: &Request<T>) -> RequestContext {
    let request_id = request
        .metadata()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok());
    RequestContext::new(RequestId::from_header(request_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestbook_core::FieldError;

    #[test]
    fn test_status_table() {
        let cases = [
            (400, Code::InvalidArgument),
            (401, Code::Unauthenticated),
            (403, Code::PermissionDenied),
            (404, Code::NotFound),
            (408, Code::DeadlineExceeded),
            (409, Code::AlreadyExists),
            (429, Code::ResourceExhausted),
            (499, Code::Cancelled),
            (501, Code::Unimplemented),
            (503, Code::Unavailable),
            (504, Code::DeadlineExceeded),
            (500, Code::Internal),
            (502, Code::Internal),
            (418, Code::Internal),
        ];
        for (status, code) in cases {
            assert_eq!(code_for_status(status), code, "status {status}");
        }
    }

    #[test]
    fn test_status_message_prefers_first_field_error() {
        let err = ServiceError::bad_request(vec![
            FieldError::new("name", "name is a required field"),
            FieldError::new("id", "id must be a valid RFC4122 UUID"),
        ]);

        let status = to_status(err);

        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "name is a required field");
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let status = to_status(ServiceError::Internal("disk on fire".into()));

        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "Internal Server Error");
    }

    #[test]
    fn test_panic_becomes_internal_status() {
        let response = panic_status(Box::new("guest table exploded"));

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(response.headers()["grpc-status"], "13");
    }

    #[test]
    fn test_request_context_from_metadata() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(REQUEST_ID_HEADER, id.parse().unwrap());

        assert_eq!(request_context(&request).request_id.to_string(), id);
    }

    #[test]
    fn test_request_context_keeps_non_uuid_metadata() {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(REQUEST_ID_HEADER, "trace-abc".parse().unwrap());

        assert_eq!(request_context(&request).request_id.as_str(), "trace-abc");
    }
}
