//! Message queue backends.
//!
//! Concrete implementations of the `MessageQueue` trait from
//! `guestbook_core::events`, selected by the same feature flags as the cache.
//!
//! - `memory` (default): in-process queues, one per topic
//! - `redis`: Redis Streams with a sorted set for delayed delivery

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

#[cfg(feature = "memory")]
pub use memory::MemoryQueue;

#[cfg(feature = "redis")]
pub use redis_impl::RedisQueue;
