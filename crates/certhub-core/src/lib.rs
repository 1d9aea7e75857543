//! Core building blocks shared by every CertHub crate.
//!
//! This crate provides:
//! - The unified [`error::AppError`] type and [`result::AppResult`] alias
//! - Configuration schemas loaded from TOML + environment variables
//! - Common request/response types (pagination)

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
