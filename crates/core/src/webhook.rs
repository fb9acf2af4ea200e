use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::ServiceError;
use crate::guest::GuestEvent;

/// Outbound delivery of guest events to an external HTTP endpoint.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// Delivers `event`; a non-success response is `ServiceError::Upstream`.
    async fn send_webhook(
        &self,
        ctx: &RequestContext,
        event: &GuestEvent,
    ) -> Result<(), ServiceError>;
}
