//! Request-scoped context passed explicitly through every call boundary.
//!
//! The context replaces ambient tracer state: transports build one per inbound
//! request (or message) and hand it down to services, repositories, the event
//! publisher and the webhook client. The propagation map is what crosses
//! process boundaries inside event envelopes and outbound HTTP headers.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

/// Header (and propagation key) carrying the request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier of a request, used for tracing and logging.
///
/// Caller-supplied ids are kept verbatim; only a missing or blank id is
/// replaced by a fresh UUID v7.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string().into())
    }

    /// Keeps a non-blank caller id, generating one otherwise.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(id) if !id.trim().is_empty() => Self(id.into()),
            _ => Self::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped context available to every layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Unique request identifier for tracing.
    pub request_id: RequestId,
}

impl RequestContext {
    pub fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }

    /// Injects this context into a propagation carrier.
    pub fn inject(&self, carrier: &mut HashMap<String, String>) {
        carrier.insert(REQUEST_ID_HEADER.to_string(), self.request_id.to_string());
    }

    /// Returns a fresh propagation map for this context.
    pub fn propagation(&self) -> HashMap<String, String> {
        let mut carrier = HashMap::new();
        self.inject(&mut carrier);
        carrier
    }

    /// Rebuilds a context from a propagation carrier.
    ///
    /// A missing or blank request id yields a newly generated one.
    pub fn extract(carrier: &HashMap<String, String>) -> Self {
        let request_id = RequestId::from_header(carrier.get(REQUEST_ID_HEADER).map(String::as_str));
        Self { request_id }
    }
}
