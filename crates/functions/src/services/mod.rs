//! Business logic services.
//!
//! # Services
//!
//! - `authz` - Super-admin guard producing per-request authorization proofs
//! - `roles` - Role assignment and lookup (custom claims)
//! - `cascade` - Tenant deletion across every partition and index
//! - `orders` - Public order submission
//! - `notify` - Best-effort new-order email worker
//! - `email` - Email rendering and SMTP delivery
//! - `subdomains` - Subdomain registry for onboarding

pub mod authz;
pub mod cascade;
pub mod email;
pub mod notify;
pub mod orders;
pub mod roles;
pub mod subdomains;

pub use authz::{AuthorizationContext, AuthorizationGuard};
pub use cascade::{CascadeReport, CascadeStep, DeleteSet, TenantDeletionCascade};
pub use email::{EmailError, EmailService};
pub use notify::{
    MailTransport, Mailer, NotificationOutcome, OrderCreated, OrderNotifier, OutgoingMail,
    RecordingMailer, spawn_order_notifications,
};
pub use orders::{OrderInput, OrderLineInput, OrderService};
pub use roles::RoleService;
pub use subdomains::SubdomainRegistry;
