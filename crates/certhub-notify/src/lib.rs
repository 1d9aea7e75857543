//! Notification dispatch engine for CertHub.
//!
//! This crate decides whether a notification should be sent, routes it
//! through the correct delivery channel, and tracks its delivery state:
//! - [`catalog`] — static routing table mapping notification kinds to
//!   preference topics and critical-override flags
//! - [`resolver`] — the two-tier (organization, then user) preference
//!   resolution rules
//! - [`channel`] — email/SMS sender traits and their HTTP providers
//! - [`dispatcher`] — create/send paths and SENT/FAILED bookkeeping
//! - [`sweeps`] — batch sweeps for scheduled sends and bounded retries
//!
//! Persistence goes through the [`store`] traits so the engine runs
//! against Postgres in production and in-memory fakes in tests.

pub mod backoff;
pub mod catalog;
pub mod channel;
pub mod dispatcher;
pub mod resolver;
pub mod store;
pub mod sweeps;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{Dispatcher, NotificationParams, SendResult};
pub use resolver::{PreferenceResolver, SendDecision};
pub use store::{NotificationStore, PreferenceStore};
