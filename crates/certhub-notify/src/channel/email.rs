//! HTTP email provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use certhub_core::config::notify::EmailProviderConfig;
use certhub_core::{AppError, AppResult};

use super::{EmailMessage, EmailSender};

/// Email provider speaking a JSON-over-HTTPS send API.
///
/// The provider returns `{"id": "..."}` on success and an error body
/// otherwise.
#[derive(Debug, Clone)]
pub struct HttpEmailProvider {
    client: reqwest::Client,
    config: EmailProviderConfig,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

impl HttpEmailProvider {
    /// Create a provider from configuration.
    pub fn new(config: EmailProviderConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    certhub_core::ErrorKind::Configuration,
                    format!("Failed to build email HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl EmailSender for HttpEmailProvider {
    async fn send(&self, message: &EmailMessage) -> AppResult<String> {
        let request = SendRequest {
            from: &message.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    certhub_core::ErrorKind::Provider,
                    format!("Email provider request failed: {e}"),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::provider(format!(
                "Email provider returned {status}: {body}"
            )));
        }

        let parsed: SendResponse = response.json().await.map_err(|e| {
            AppError::with_source(
                certhub_core::ErrorKind::Provider,
                format!("Email provider returned an unexpected body: {e}"),
                e,
            )
        })?;

        tracing::debug!(message_id = %parsed.id, to = %message.to, "Email accepted by provider");
        Ok(parsed.id)
    }
}
