//! Individual member entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An individual member (staff) belonging to an organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    /// Unique member identifier.
    pub id: Uuid,
    /// The organization this member belongs to.
    pub organization_id: Uuid,
    /// Full name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Mobile phone number, if recorded.
    pub phone: Option<String>,
    /// When the member was created.
    pub created_at: DateTime<Utc>,
}
