//! Shared request/response types.

pub mod pagination;
