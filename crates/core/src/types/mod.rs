//! Core types for Menuboard.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;
pub mod subdomain;
pub mod tenant;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use role::{ClaimsError, CustomClaims, Role, RoleError, RoleInfo};
pub use status::OrderStatus;
pub use subdomain::{Subdomain, SubdomainError};
pub use tenant::{Order, OrderLineItem, RegistryEntry, TenantProfile};
