//! Member organization entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A member organization of the trade association.
///
/// The contact fields identify the organization owner, the default
/// recipient for organization-level notifications.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    /// Unique organization identifier.
    pub id: Uuid,
    /// Trading name.
    pub name: String,
    /// Owner / primary contact name.
    pub contact_name: String,
    /// Owner contact email.
    pub contact_email: String,
    /// Owner contact phone, if recorded.
    pub contact_phone: Option<String>,
    /// When the organization joined.
    pub created_at: DateTime<Utc>,
}
