//! Monitored compliance entities.
//!
//! Each entity carries alert-sent flags that make the scheduled sweeps
//! idempotent: a threshold alert fires at most once per entity per
//! threshold crossing. Flags are never reset except by the underlying
//! condition changing (e.g. a renewed policy is a new row).

pub mod capa;
pub mod document;
pub mod enrolment;
pub mod insurance;
pub mod licence;

pub use capa::{CapaStatus, CorrectiveAction};
pub use document::{ComplianceDocument, REVIEW_THRESHOLDS};
pub use enrolment::{Enrolment, EnrolmentStatus};
pub use insurance::{InsurancePolicy, PolicyType, EXPIRY_THRESHOLDS};
pub use licence::{LicenceStatus, PractitionerLicence};
