//! Database-backed integration tests.
//!
//! These require a PostgreSQL instance reachable through the
//! `CERTHUB_TEST_DATABASE_URL` environment variable. When the variable is
//! unset every test returns early, so the suite is safe to run anywhere.

mod helpers;

mod dispatch_test;
mod sweeps_test;
