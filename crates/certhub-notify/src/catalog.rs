//! Static routing catalog: one record per notification kind.
//!
//! A single structure replaces the parallel per-channel lookup tables the
//! portal grew over time. "Always send" is an explicit flag on the record,
//! never the absence of a mapping.

use certhub_entity::notification::{NotificationKind, PreferenceTopic};

/// Routing rules for one notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    /// Preference topic the kind's opt-out flags live under.
    pub topic: PreferenceTopic,
    /// Delivered regardless of stored preferences on every channel.
    pub always_send: bool,
    /// Delivered regardless of stored preferences on the SMS channel.
    /// These kinds sit in the non-optional "critical SMS" bucket.
    pub sms_critical: bool,
}

/// Look up the routing record for a notification kind.
///
/// Every kind has a record; the match is exhaustive by construction.
pub fn routing(kind: NotificationKind) -> Routing {
    use NotificationKind::*;
    use PreferenceTopic::*;

    match kind {
        InsuranceExpiring => Routing {
            topic: Insurance,
            always_send: false,
            sms_critical: false,
        },
        InsuranceExpired => Routing {
            topic: Insurance,
            always_send: false,
            sms_critical: true,
        },
        AuditScheduled => Routing {
            topic: Audit,
            always_send: false,
            sms_critical: false,
        },
        AuditCompleted => Routing {
            topic: Audit,
            always_send: false,
            sms_critical: false,
        },
        CapaAssigned => Routing {
            topic: CorrectiveAction,
            always_send: false,
            sms_critical: false,
        },
        CapaOverdue => Routing {
            topic: CorrectiveAction,
            always_send: false,
            sms_critical: true,
        },
        DocumentReviewDue => Routing {
            topic: Document,
            always_send: false,
            sms_critical: false,
        },
        ProgrammeRenewalDue => Routing {
            topic: Programme,
            always_send: false,
            sms_critical: false,
        },
        ProgrammeStatusChange => Routing {
            topic: Programme,
            always_send: true,
            sms_critical: true,
        },
        LicenceStatusChange => Routing {
            topic: Credential,
            always_send: true,
            sms_critical: true,
        },
        CredentialExpiring => Routing {
            topic: Credential,
            always_send: false,
            sms_critical: false,
        },
        Welcome => Routing {
            topic: System,
            always_send: false,
            sms_critical: false,
        },
        SystemAnnouncement => Routing {
            topic: System,
            always_send: false,
            sms_critical: false,
        },
    }
}
