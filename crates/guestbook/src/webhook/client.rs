use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use guestbook_core::guest::GuestEvent;
use guestbook_core::webhook::WebhookSender;
use guestbook_core::{RequestContext, ServiceError};

use crate::config::WebhookConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts guest events as JSON to `base_url + endpoint`.
#[derive(Debug, Clone)]
pub struct HttpWebhookSender {
    client: reqwest::Client,
    url: String,
}

impl HttpWebhookSender {
    pub fn new(config: &WebhookConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: config.url(),
        })
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send_webhook(
        &self,
        ctx: &RequestContext,
        event: &GuestEvent,
    ) -> Result<(), ServiceError> {
        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .json(event);
        for (name, value) in ctx.propagation() {
            request = request.header(name, value);
        }

        tracing::debug!(request_id = %ctx.request_id, url = %self.url, guest_id = %event.id, "Sending webhook");

        let response = request.send().await.map_err(|e| {
            tracing::error!(request_id = %ctx.request_id, url = %self.url, error = %e, "Webhook request failed");
            ServiceError::Internal(e.to_string())
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                tracing::error!(request_id = %ctx.request_id, status = status.as_u16(), body = %body, "Webhook rejected");
            } else {
                tracing::warn!(request_id = %ctx.request_id, status = status.as_u16(), body = %body, "Webhook rejected");
            }
            return Err(ServiceError::Upstream {
                status: status.as_u16(),
                message: body,
            });
        }

        tracing::debug!(request_id = %ctx.request_id, status = status.as_u16(), "Webhook delivered");
        Ok(())
    }
}
