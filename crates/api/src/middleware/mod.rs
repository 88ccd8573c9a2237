//! Request authorization extractors.
//!
//! - [`auth::CronCaller`] -- scheduler trigger (shared secret or platform header).
//! - [`auth::OperatorAuth`] -- operator endpoints (bearer token).

pub mod auth;
