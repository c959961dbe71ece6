//! Application state shared across handlers.

use std::sync::Arc;

use tokio::task::JoinHandle;

use menuboard_core::Uid;

use crate::services::{
    AuthorizationGuard, Mailer, OrderNotifier, OrderService, RoleService, SubdomainRegistry,
    TenantDeletionCascade, spawn_order_notifications,
};
use crate::store::{DocumentBackend, IdentityBackend};
use crate::token::IdTokenVerifier;

/// Application state shared across all handlers.
///
/// Cheap to clone (wraps an `Arc`).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    documents: DocumentBackend,
    tokens: IdTokenVerifier,
    guard: AuthorizationGuard<IdentityBackend>,
    roles: RoleService<IdentityBackend>,
    cascade: TenantDeletionCascade<DocumentBackend, IdentityBackend>,
    orders: OrderService<DocumentBackend>,
    subdomains: SubdomainRegistry<DocumentBackend>,
}

impl AppState {
    /// Wire every service onto the given stores and start the order
    /// notification worker.
    ///
    /// Must be called inside a Tokio runtime. The returned handle finishes
    /// once the state (the last event sender) is dropped.
    #[must_use]
    pub fn new(
        documents: DocumentBackend,
        identities: IdentityBackend,
        mailer: Mailer,
        tokens: IdTokenVerifier,
        bootstrap_uid: Uid,
    ) -> (Self, JoinHandle<()>) {
        let (events, worker) =
            spawn_order_notifications(OrderNotifier::new(documents.clone(), mailer));

        let inner = AppStateInner {
            tokens,
            guard: AuthorizationGuard::new(identities.clone(), bootstrap_uid.clone()),
            roles: RoleService::new(identities.clone()),
            cascade: TenantDeletionCascade::new(documents.clone(), identities, bootstrap_uid),
            orders: OrderService::new(documents.clone(), events),
            subdomains: SubdomainRegistry::new(documents.clone()),
            documents,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            worker,
        )
    }

    #[must_use]
    pub fn documents(&self) -> &DocumentBackend {
        &self.inner.documents
    }

    #[must_use]
    pub fn tokens(&self) -> &IdTokenVerifier {
        &self.inner.tokens
    }

    #[must_use]
    pub fn guard(&self) -> &AuthorizationGuard<IdentityBackend> {
        &self.inner.guard
    }

    #[must_use]
    pub fn roles(&self) -> &RoleService<IdentityBackend> {
        &self.inner.roles
    }

    #[must_use]
    pub fn cascade(&self) -> &TenantDeletionCascade<DocumentBackend, IdentityBackend> {
        &self.inner.cascade
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService<DocumentBackend> {
        &self.inner.orders
    }

    #[must_use]
    pub fn subdomains(&self) -> &SubdomainRegistry<DocumentBackend> {
        &self.inner.subdomains
    }
}
