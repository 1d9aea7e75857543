//! Notification engine configuration.

use serde::{Deserialize, Serialize};

/// Notification dispatch and retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Sender address for outbound email.
    pub from_address: String,
    /// Display name for outbound email.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Base URL of the member portal, used for action links and the
    /// preference-management footer in email templates.
    #[serde(default = "default_portal_base_url")]
    pub portal_base_url: String,
    /// Email provider settings.
    pub email: EmailProviderConfig,
    /// SMS provider settings.
    pub sms: SmsProviderConfig,
    /// Maximum delivery attempts before a notification becomes terminal.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay in seconds for the exponential retry backoff.
    #[serde(default = "default_retry_base")]
    pub retry_base_seconds: u64,
    /// Maximum rows processed per scheduled-notification sweep.
    #[serde(default = "default_scheduled_batch")]
    pub scheduled_batch_size: i64,
    /// Maximum rows processed per retry sweep.
    #[serde(default = "default_retry_batch")]
    pub retry_batch_size: i64,
}

/// HTTP email provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailProviderConfig {
    /// Provider send endpoint.
    pub api_url: String,
    /// Provider API key (sent as a bearer token).
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

/// HTTP SMS gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsProviderConfig {
    /// Gateway send endpoint.
    pub api_url: String,
    /// Gateway API key (sent as a bearer token).
    pub api_key: String,
    /// Sender id shown to recipients.
    #[serde(default = "default_sender_id")]
    pub sender_id: String,
    /// Request timeout in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_from_name() -> String {
    "CertHub".to_string()
}

fn default_portal_base_url() -> String {
    "https://portal.certhub.example".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base() -> u64 {
    300
}

fn default_sender_id() -> String {
    "CertHub".to_string()
}

fn default_scheduled_batch() -> i64 {
    100
}

fn default_retry_batch() -> i64 {
    50
}

fn default_provider_timeout() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_config_fills_sender_id_and_timeout() {
        let sms: SmsProviderConfig = serde_json::from_value(serde_json::json!({
            "api_url": "https://sms.example/send",
            "api_key": "key",
        }))
        .unwrap();
        assert_eq!(sms.sender_id, "CertHub");
        assert_eq!(sms.timeout_seconds, 15);
    }

    #[test]
    fn notify_config_fills_dispatch_defaults() {
        let config: NotifyConfig = serde_json::from_value(serde_json::json!({
            "from_address": "no-reply@certhub.example",
            "email": { "api_url": "https://mail.example/send", "api_key": "key" },
            "sms": { "api_url": "https://sms.example/send", "api_key": "key" },
        }))
        .unwrap();
        assert_eq!(config.from_name, "CertHub");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_seconds, 300);
        assert_eq!(config.scheduled_batch_size, 100);
        assert_eq!(config.retry_batch_size, 50);
    }
}
