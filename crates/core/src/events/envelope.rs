use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::context::RequestContext;

use super::{EventError, Result};

/// A named payload plus the trace-propagation map of the producing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    #[serde(default)]
    pub tracer_propagator: HashMap<String, String>,
    pub event_name: String,
    pub message: T,
}

impl<T> EventEnvelope<T> {
    pub fn new(ctx: &RequestContext, event_name: impl Into<String>, message: T) -> Self {
        Self {
            tracer_propagator: ctx.propagation(),
            event_name: event_name.into(),
            message,
        }
    }

    /// Context of the request that produced this event.
    pub fn context(&self) -> RequestContext {
        RequestContext::extract(&self.tracer_propagator)
    }
}

impl<T: Serialize> EventEnvelope<T> {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| EventError::Serialization(e.to_string()))
    }
}

impl<T: for<'de> Deserialize<'de>> EventEnvelope<T> {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| EventError::Serialization(e.to_string()))
    }
}
