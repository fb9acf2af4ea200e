//! Application services orchestrating storage, cache, events and webhooks.

mod guest;

pub use guest::GuestService;
