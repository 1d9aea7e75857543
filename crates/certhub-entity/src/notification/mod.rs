//! Notification entities: the notification row itself, its delivery
//! enums, and the user/organization preference records.

pub mod channel;
pub mod kind;
pub mod model;
pub mod preference;
pub mod status;

pub use channel::NotificationChannel;
pub use kind::NotificationKind;
pub use model::Notification;
pub use preference::{
    OrganizationNotificationPreference, PreferenceTopic, UserNotificationPreference,
};
pub use status::{NotificationPriority, NotificationStatus};
