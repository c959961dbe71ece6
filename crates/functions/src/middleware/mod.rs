//! HTTP middleware and extractors.
//!
//! The layer stack itself (Sentry, `TraceLayer`) is assembled in
//! [`crate::app`]; this module holds the per-request extractors.

pub mod auth;

pub use auth::{OptionalCaller, RequireCaller};
