//! Core domain for the guestbook service.
//!
//! Pure types, traits and functions shared by every transport. Nothing in this
//! crate performs I/O on its own; adapters in the `guestbook` binary implement
//! the traits defined here.

pub mod cache;
pub mod context;
pub mod error;
pub mod events;
pub mod guest;
pub mod storage;
pub mod webhook;

pub use context::{RequestContext, RequestId, REQUEST_ID_HEADER};
pub use error::{FieldError, ServiceError};
