//! Webhook egress over HTTP.

mod client;

pub use client::HttpWebhookSender;
