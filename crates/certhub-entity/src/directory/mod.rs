//! Organization and member directory entities.

pub mod member;
pub mod organization;

pub use member::Member;
pub use organization::Organization;
