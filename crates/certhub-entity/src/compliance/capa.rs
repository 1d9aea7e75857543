//! Corrective action (CAPA) entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Workflow status of a corrective action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "capa_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CapaStatus {
    /// Raised, not yet started.
    Open,
    /// Being worked on.
    InProgress,
    /// Verified and closed.
    Closed,
}

impl CapaStatus {
    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for CapaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A corrective action raised from an audit finding, assigned to a member
/// with a due date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CorrectiveAction {
    /// Unique corrective action identifier.
    pub id: Uuid,
    /// The organization the finding belongs to.
    pub organization_id: Uuid,
    /// The member responsible for closing it out, if assigned.
    pub assignee_id: Option<Uuid>,
    /// Short description of the required action.
    pub title: String,
    /// Longer description, if recorded.
    pub description: Option<String>,
    /// When the action must be completed.
    pub due_date: DateTime<Utc>,
    /// Workflow status.
    pub status: CapaStatus,
    /// Overdue alert already sent.
    pub overdue_alert_sent: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CorrectiveAction {
    /// An action is overdue when its due date has passed and it is not
    /// closed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != CapaStatus::Closed && self.due_date < now
    }
}
