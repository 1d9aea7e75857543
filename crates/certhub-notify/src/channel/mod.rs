//! Delivery channel adapters.
//!
//! The dispatcher talks to channels through the [`EmailSender`] and
//! [`SmsSender`] traits; the HTTP providers here are the production
//! implementations. Tests substitute fakes.

pub mod email;
pub mod sms;

use async_trait::async_trait;

use certhub_core::AppResult;

pub use email::HttpEmailProvider;
pub use sms::HttpSmsProvider;

/// An outbound email ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Sender in `Name <address>` form.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Rendered HTML body.
    pub html: String,
}

/// Email delivery provider.
#[async_trait]
pub trait EmailSender: Send + Sync + std::fmt::Debug {
    /// Send one email. Returns the provider-assigned message id.
    async fn send(&self, message: &EmailMessage) -> AppResult<String>;
}

/// SMS delivery gateway.
#[async_trait]
pub trait SmsSender: Send + Sync + std::fmt::Debug {
    /// Send one text message. Returns the gateway-assigned message id.
    async fn send(&self, phone_number: &str, message: &str) -> AppResult<String>;
}
