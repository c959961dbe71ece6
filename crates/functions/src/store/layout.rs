//! Where each tenant's documents live.
//!
//! ```text
//! profile/{tenant}                      store profile
//! profile/{tenant}/profile/{doc}        profile sub-documents
//! profile/{tenant}/settings/{doc}       settings
//! menu/{tenant}                         menu root
//! menu/{tenant}/categories/{id}         categories
//! menu/{tenant}/items/{id}              items
//! submissions/{tenant}                  submissions root
//! submissions/{tenant}/data/{orderId}   customer orders
//! subdomains/{autoId}                   { subdomain, userId }
//! publicMenus/{autoId}                  { userId, ... }
//! ```

use menuboard_core::{OrderId, TenantId};

use super::path::{CollectionPath, DocPath, PathError};

pub const PROFILE: &str = "profile";
pub const PROFILE_DOCS: &str = "profile";
pub const SETTINGS: &str = "settings";
pub const MENU: &str = "menu";
pub const CATEGORIES: &str = "categories";
pub const ITEMS: &str = "items";
pub const SUBMISSIONS: &str = "submissions";
pub const SUBMISSION_DATA: &str = "data";
pub const SUBDOMAINS: &str = "subdomains";
pub const PUBLIC_MENUS: &str = "publicMenus";

/// Field holding the owning uid on registry and public menu entries.
pub const USER_ID_FIELD: &str = "userId";
/// Field holding the subdomain string on registry entries.
pub const SUBDOMAIN_FIELD: &str = "subdomain";

/// `profile/{tenant}`
///
/// # Errors
///
/// Returns a [`PathError`] if the tenant id is not a valid path segment.
pub fn profile_root(tenant: &TenantId) -> Result<DocPath, PathError> {
    CollectionPath::root(PROFILE).doc(tenant.as_str())
}

/// `menu/{tenant}`
///
/// # Errors
///
/// Returns a [`PathError`] if the tenant id is not a valid path segment.
pub fn menu_root(tenant: &TenantId) -> Result<DocPath, PathError> {
    CollectionPath::root(MENU).doc(tenant.as_str())
}

/// `submissions/{tenant}`
///
/// # Errors
///
/// Returns a [`PathError`] if the tenant id is not a valid path segment.
pub fn submissions_root(tenant: &TenantId) -> Result<DocPath, PathError> {
    CollectionPath::root(SUBMISSIONS).doc(tenant.as_str())
}

/// `submissions/{tenant}/data/{order}`
///
/// # Errors
///
/// Returns a [`PathError`] if either id is not a valid path segment.
pub fn order_doc(tenant: &TenantId, order: &OrderId) -> Result<DocPath, PathError> {
    submissions_root(tenant)?
        .collection(SUBMISSION_DATA)
        .doc(order.as_str())
}

#[must_use]
pub fn subdomains() -> CollectionPath {
    CollectionPath::root(SUBDOMAINS)
}

#[must_use]
pub fn public_menus() -> CollectionPath {
    CollectionPath::root(PUBLIC_MENUS)
}
