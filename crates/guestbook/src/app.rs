use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use guestbook_core::REQUEST_ID_HEADER;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    context,
    handlers::{
        guests::{create_guest, delete_guest, get_guest, list_guests, update_guest},
        error::panic_response,
        health::livez,
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ]);

    let guest_routes = Router::new()
        .route("/guests", get(list_guests).post(create_guest))
        .route(
            "/guests/{id}",
            get(get_guest).put(update_guest).delete(delete_guest),
        )
        .layer(cors);

    let routes = Router::new()
        .route("/livez", get(livez))
        .merge(guest_routes)
        .with_state(state);

    with_middleware(routes, request_timeout)
}

/// Panic recovery, tracing, the request timeout and request ids, innermost
/// first.
fn with_middleware(routes: Router, request_timeout: Duration) -> Router {
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(context::request_id))
}
