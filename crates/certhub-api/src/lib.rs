//! # certhub-api
//!
//! Axum HTTP layer for CertHub: the in-app notification feed, the
//! preference settings endpoints, health, and the shared-secret-guarded
//! cron trigger endpoints. Identity is an external concern; member and
//! organization scoped endpoints take explicit ids.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
