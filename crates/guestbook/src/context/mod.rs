//! Request-scoped context for the HTTP transport.
//!
//! The `request_id` middleware resolves the request id once per request and
//! echoes it on the response; the `Ctx` extractor hands the resulting
//! `RequestContext` to handlers.

mod extractor;

pub use extractor::{request_id, Ctx};
