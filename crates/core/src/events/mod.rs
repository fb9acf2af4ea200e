mod envelope;
mod error;
mod publisher;
mod traits;

pub use envelope::EventEnvelope;
pub use error::{EventError, Result};
pub use publisher::EventPublisher;
pub use traits::{Message, MessageQueue};
