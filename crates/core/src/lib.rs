//! Menuboard Core - Shared types library.
//!
//! This crate provides common types used across all Menuboard components:
//! - `functions` - Privileged backend (role assignment, tenant deletion, order notifications)
//! - `cli` - Command-line tools for migrations and bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, emails, roles and claims, subdomains, prices,
//!   and the tenant document shapes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
