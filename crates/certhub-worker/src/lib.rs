//! # certhub-worker
//!
//! Background sweep jobs for CertHub: the delivery sweeps (scheduled
//! sends and bounded retries) and the domain sweeps that watch
//! compliance entities for threshold crossings. Jobs are registered in a
//! [`job::SweepRegistry`] so both the in-process cron scheduler and the
//! HTTP cron endpoints run them by name.

pub mod job;
pub mod jobs;
pub mod scheduler;

pub use job::{SweepJob, SweepRegistry};
pub use scheduler::SweepScheduler;
