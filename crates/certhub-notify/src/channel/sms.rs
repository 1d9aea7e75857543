//! HTTP SMS gateway.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use certhub_core::config::notify::SmsProviderConfig;
use certhub_core::{AppError, AppResult};

use super::SmsSender;

/// SMS gateway speaking a JSON-over-HTTPS send API.
///
/// The gateway responds with `{"success": true, "message_id": "..."}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpSmsProvider {
    client: reqwest::Client,
    config: SmsProviderConfig,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    message: &'a str,
    sender_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    success: bool,
    message_id: Option<String>,
    error: Option<String>,
}

impl HttpSmsProvider {
    /// Create a gateway client from configuration.
    pub fn new(config: SmsProviderConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    certhub_core::ErrorKind::Configuration,
                    format!("Failed to build SMS HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SmsSender for HttpSmsProvider {
    async fn send(&self, phone_number: &str, message: &str) -> AppResult<String> {
        let request = SendRequest {
            to: phone_number,
            message,
            sender_id: &self.config.sender_id,
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
                    format!("SMS gateway request failed: {e}"),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::provider(format!(
                "SMS gateway returned {status}: {body}"
            )));
        }

        let parsed: SendResponse = response.json().await.map_err(|e| {
            AppError::with_source(
                certhub_core::ErrorKind::Provider,
                format!("SMS gateway returned an unexpected body: {e}"),
                e,
            )
        })?;

        if !parsed.success {
            return Err(AppError::provider(format!(
                "SMS gateway rejected the message: {}",
                parsed.error.unwrap_or_else(|| "no error given".to_string())
            )));
        }

        let message_id = parsed
            .message_id
            .ok_or_else(|| AppError::provider("SMS gateway accepted without a message id"))?;

        tracing::debug!(message_id = %message_id, "SMS accepted by gateway");
        Ok(message_id)
    }
}
