//! Axum middleware and extractor for `RequestContext`.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use guestbook_core::{RequestContext, RequestId, REQUEST_ID_HEADER};

fn extract_request_id(headers: &HeaderMap) -> RequestId {
    RequestId::from_header(headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()))
}

/// Resolves the request id, stores the context in the request extensions
/// and sets `x-request-id` on the response.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = extract_request_id(request.headers());
    let echoed = HeaderValue::from_str(request_id.as_str());
    request
        .extensions_mut()
        .insert(RequestContext::new(request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = echoed {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Extractor for the request-scoped [`RequestContext`].
#[derive(Debug, Clone)]
pub struct Ctx(pub RequestContext);

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::new(extract_request_id(&parts.headers)));
        Ok(Ctx(ctx))
    }
}
