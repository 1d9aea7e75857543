//! Sweep job implementations.

pub mod capa;
pub mod delivery;
pub mod document;
pub mod enrolment;
pub mod insurance;
pub mod licence;

pub use capa::OverdueCapaJob;
pub use delivery::{RetrySweepJob, ScheduledSweepJob};
pub use document::DocumentReviewJob;
pub use enrolment::ProgrammeRenewalJob;
pub use insurance::InsuranceExpiryJob;
pub use licence::LicenceStatusJob;

/// Registry names, also the `{job}` segments of the cron endpoints.
pub const DELIVERY_SWEEP: &str = "delivery";
pub const RETRY_SWEEP: &str = "retry";
pub const INSURANCE_SWEEP: &str = "insurance_expiry";
pub const DOCUMENT_SWEEP: &str = "document_review";
pub const ENROLMENT_SWEEP: &str = "programme_renewal";
pub const CAPA_SWEEP: &str = "overdue_capa";
pub const LICENCE_SWEEP: &str = "licence_status";
