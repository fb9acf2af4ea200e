//! Guest event handling.

use guestbook_core::events::{EventEnvelope, Message};
use guestbook_core::guest::GuestEvent;
use guestbook_core::ServiceError;

use crate::services::GuestService;

/// Decodes a guest event envelope and forwards it to the webhook.
///
/// The request id of the producing request is carried over from the
/// envelope, or generated when the producer sent none.
pub async fn handle_guest_event(guests: &GuestService, message: &Message) -> Result<(), ServiceError> {
    let envelope = EventEnvelope::<GuestEvent>::from_bytes(&message.body)?;
    let ctx = envelope.context();

    tracing::debug!(
        request_id = %ctx.request_id,
        topic = %message.topic,
        event_name = %envelope.event_name,
        guest_id = %envelope.message.id,
        "Handling guest event"
    );

    guests.process_event(&ctx, envelope.message).await
}
