//! Domain entity models for CertHub.
//!
//! Entities are plain data structs deriving `serde` and `sqlx::FromRow`,
//! grouped by domain:
//! - `notification` — notification rows, delivery enums, preferences
//! - `compliance` — the monitored entities carrying alert-sent flags
//! - `directory` — organizations and their members

pub mod compliance;
pub mod directory;
pub mod notification;
