//! Repository implementations for all CertHub entities.

pub mod capa;
pub mod document;
pub mod enrolment;
pub mod insurance;
pub mod licence;
pub mod member;
pub mod notification;
pub mod organization;
pub mod preference;

pub use capa::CorrectiveActionRepository;
pub use document::DocumentRepository;
pub use enrolment::EnrolmentRepository;
pub use insurance::InsurancePolicyRepository;
pub use licence::LicenceRepository;
pub use member::MemberRepository;
pub use notification::NotificationRepository;
pub use organization::OrganizationRepository;
pub use preference::PreferenceRepository;
