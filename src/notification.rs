//! Webhook notification
//!
//! Posts the summary to a generic webhook when availability was found.
//! Delivery is best-effort: callers log failures and carry on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::config::{WebhookFormat, WebhookSettings};
use crate::error::CheckError;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can deliver a finished summary.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &str) -> Result<(), CheckError>;
}

/// Request body and content type for one webhook post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookPayload {
    pub content_type: &'static str,
    pub body: String,
}

impl WebhookPayload {
    pub fn build(format: WebhookFormat, json_key: &str, summary: &str) -> Self {
        match format {
            WebhookFormat::Json => {
                let mut object = serde_json::Map::new();
                object.insert(
                    json_key.to_string(),
                    serde_json::Value::String(summary.to_string()),
                );
                WebhookPayload {
                    content_type: "application/json",
                    body: serde_json::Value::Object(object).to_string(),
                }
            }
            WebhookFormat::Text => WebhookPayload {
                content_type: "text/plain; charset=utf-8",
                body: summary.to_string(),
            },
        }
    }
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    settings: WebhookSettings,
}

impl WebhookNotifier {
    pub fn new(settings: WebhookSettings) -> Result<Self, CheckError> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, summary: &str) -> Result<(), CheckError> {
        let payload = WebhookPayload::build(self.settings.format, &self.settings.json_key, summary);

        let resp = self
            .client
            .post(self.settings.url.clone())
            .header(CONTENT_TYPE, payload.content_type)
            .body(payload.body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(CheckError::Status {
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
