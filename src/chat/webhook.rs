use super::backend::{ChatBackend, HealthStatus};
use super::error::ChatError;
use super::message::BotMessage;
use super::session::SessionContext;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

pub const WEBHOOK_PATH: &str = "/webhooks/rest/webhook";
const HEALTH_PATHS: [&str; 2] = ["/status", "/version"];
const MAX_BODY_PREVIEW: usize = 200;

#[derive(Serialize)]
struct WebhookRequest<'a> {
    sender: &'a str,
    message: &'a str,
}

/// Talks to the backend's REST input channel.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Request(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> ChatError {
        if e.is_timeout() {
            ChatError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            ChatError::Unavailable {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else if e.is_decode() {
            ChatError::Decode(e.to_string())
        } else {
            ChatError::Request(e.to_string())
        }
    }

    async fn probe(&self, url: &str) -> Result<HealthStatus, ChatError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        Ok(HealthStatus {
            endpoint: url.to_string(),
            detail: Some(preview(&body)).filter(|b| !b.is_empty()),
        })
    }
}

fn preview(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_BODY_PREVIEW) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[async_trait]
impl ChatBackend for WebhookClient {
    async fn send(
        &self,
        context: &SessionContext,
        message: &str,
    ) -> Result<Vec<BotMessage>, ChatError> {
        let url = format!("{}{}", context.server_url(), WEBHOOK_PATH);
        debug!("POST {} as {}", url, context.sender_id());

        let response = self
            .client
            .post(&url)
            .json(&WebhookRequest {
                sender: context.sender_id(),
                message,
            })
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(&url, e))?;
        let replies: Vec<BotMessage> =
            serde_json::from_slice(&body).map_err(|e| ChatError::Decode(e.to_string()))?;
        debug!("Received {} reply elements", replies.len());
        Ok(replies)
    }

    /// Tries `/status` first, then `/version`.
    async fn health(&self, context: &SessionContext) -> Result<HealthStatus, ChatError> {
        let mut last_error = None;
        for path in HEALTH_PATHS {
            let url = format!("{}{}", context.server_url(), path);
            match self.probe(&url).await {
                Ok(status) => {
                    info!("Backend healthy at {}", url);
                    return Ok(status);
                }
                Err(e) => {
                    debug!("Health probe {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ChatError::Request("no health endpoint".to_string())))
    }

    fn describe(&self, context: &SessionContext) -> String {
        format!("{}{}", context.server_url(), WEBHOOK_PATH)
    }
}
