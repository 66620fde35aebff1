//! One-shot webhook delivery.

use crate::payload::OutboundPayload;
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

/// Default bound on a single webhook request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Terminal result of a delivery attempt. Nothing is retried.
#[derive(Clone, Debug, PartialEq)]
pub enum DeliveryOutcome {
    /// Endpoint answered 200
    Success { body: String },
    /// Endpoint answered with any other status
    RemoteRejected { status: u16, body: String },
    /// No response within the timeout
    Timeout,
    /// Connection-level failure
    TransportFailure(String),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success { .. })
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Success { .. } => write!(f, "delivered"),
            DeliveryOutcome::RemoteRejected { status, .. } => {
                write!(f, "webhook rejected payload with HTTP {}", status)
            }
            DeliveryOutcome::Timeout => write!(f, "timeout sending data to webhook"),
            DeliveryOutcome::TransportFailure(e) => write!(f, "failed to send data to webhook: {}", e),
        }
    }
}

/// POSTs payloads to a fixed webhook URL with a bounded wait.
#[derive(Clone)]
pub struct WebhookShipper {
    url: String,
    timeout: Duration,
    http_client: Client,
}

impl WebhookShipper {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("sensor-blaster/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build webhook HTTP client")?;
        Ok(Self {
            url,
            timeout,
            http_client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one payload. Every outcome is logged and returned; none retried.
    pub async fn send(&self, payload: &OutboundPayload<'_>) -> DeliveryOutcome {
        let body = match payload.to_bytes() {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to encode payload");
                return DeliveryOutcome::TransportFailure(e.to_string());
            }
        };

        debug!(url = %self.url, size_bytes = body.len(), "Sending POST request");

        let outcome = match self.post(body).await {
            Ok((status, text)) if status == StatusCode::OK => {
                debug!(response = %text, "Webhook response");
                DeliveryOutcome::Success { body: text }
            }
            Ok((status, text)) => {
                error!(status = status.as_u16(), "Error sending to webhook");
                error!(response = %text, "Webhook response");
                DeliveryOutcome::RemoteRejected {
                    status: status.as_u16(),
                    body: text,
                }
            }
            Err(e) if e.is_timeout() => {
                error!(timeout_secs = self.timeout.as_secs_f64(), "Timeout sending data to webhook");
                DeliveryOutcome::Timeout
            }
            Err(e) => {
                error!(error = %e, "Failed to send data to webhook");
                DeliveryOutcome::TransportFailure(e.to_string())
            }
        };

        if outcome.is_success() {
            let groups = payload.groups();
            info!(
                entities = groups.total_count(),
                groups = groups.len(),
                "Successfully sent payload"
            );
        }
        outcome
    }

    async fn post(&self, body: Vec<u8>) -> reqwest::Result<(StatusCode, String)> {
        let response = self
            .http_client
            .post(&self.url)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        Ok((status, text))
    }
}
