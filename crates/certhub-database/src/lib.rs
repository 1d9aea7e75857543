//! # certhub-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for all CertHub entities, including the Postgres
//! implementations of the notification engine's store traits.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
