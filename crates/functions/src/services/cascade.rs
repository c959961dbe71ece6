//! Tenant deletion: remove a user's whole partition, then the user.
//!
//! Deletes are gathered step by step into [`DeleteSet`]s and committed as a
//! single [`WriteBatch`]. The identity record is only deleted after that
//! commit succeeds, so a failed cascade never leaves an orphaned partition
//! without its owner.

use std::fmt;

use tracing::{error, info, instrument};

use menuboard_core::{TenantId, Uid};

use crate::error::FunctionError;
use crate::services::authz::AuthorizationContext;
use crate::services::roles::require_uid;
use crate::store::{
    CollectionPath, DocPath, DocumentStore, IdentityStore, WriteBatch, layout,
};

/// One stage of the cascade, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    Profile,
    Menu,
    Submissions,
    SubdomainRegistry,
    PublicMenus,
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Profile => "profile",
            Self::Menu => "menu",
            Self::Submissions => "submissions",
            Self::SubdomainRegistry => "subdomains",
            Self::PublicMenus => "public_menus",
        })
    }
}

/// Documents one step will delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSet {
    pub step: CascadeStep,
    pub paths: Vec<DocPath>,
}

impl DeleteSet {
    const fn empty(step: CascadeStep) -> Self {
        Self {
            step,
            paths: Vec::new(),
        }
    }
}

/// What a completed cascade removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    pub uid: Uid,
    /// Document count per step, in execution order.
    pub deleted: Vec<(CascadeStep, usize)>,
}

impl CascadeReport {
    /// Total documents deleted across every step.
    #[must_use]
    pub fn total(&self) -> usize {
        self.deleted.iter().map(|(_, n)| n).sum()
    }

    /// Documents deleted by `step`.
    #[must_use]
    pub fn count(&self, step: CascadeStep) -> usize {
        self.deleted
            .iter()
            .find(|(s, _)| *s == step)
            .map_or(0, |(_, n)| *n)
    }
}

/// Deletes a tenant's documents and identity.
#[derive(Clone)]
pub struct TenantDeletionCascade<D, I> {
    documents: D,
    identities: I,
    bootstrap_uid: Uid,
}

impl<D: DocumentStore, I: IdentityStore> TenantDeletionCascade<D, I> {
    pub const fn new(documents: D, identities: I, bootstrap_uid: Uid) -> Self {
        Self {
            documents,
            identities,
            bootstrap_uid,
        }
    }

    /// Delete every document owned by `uid`, then its identity record.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty uid
    /// - `PermissionDenied` when targeting the bootstrap principal, whoever asks
    /// - `Internal` when the target has no identity record, or when the batch
    ///   commit or identity delete fails
    #[instrument(
        skip(self, ctx),
        fields(caller = %ctx.caller(), caller_role = %ctx.role(), bootstrap = ctx.is_bootstrap())
    )]
    pub async fn delete_tenant_user(
        &self,
        ctx: &AuthorizationContext,
        uid: &str,
    ) -> Result<CascadeReport, FunctionError> {
        let target = require_uid(uid)?;
        if target == self.bootstrap_uid {
            return Err(FunctionError::PermissionDenied(
                "the bootstrap super-admin cannot be deleted".to_owned(),
            ));
        }

        if self.identities.get_user(&target).await?.is_none() {
            return Err(FunctionError::Internal(format!(
                "no user record for uid {target}"
            )));
        }

        let sets = self.collect(&target).await?;

        let mut batch = WriteBatch::new();
        for path in sets.iter().flat_map(|set| set.paths.iter()) {
            batch.delete(path.clone());
        }
        let report = CascadeReport {
            uid: target.clone(),
            deleted: sets.iter().map(|s| (s.step, s.paths.len())).collect(),
        };

        if let Err(e) = self.documents.commit(batch).await {
            error!(target_uid = %target, error = %e, "Cascade batch commit failed, identity kept");
            return Err(e.into());
        }

        self.identities.delete_user(&target).await?;

        info!(
            target_uid = %target,
            total = report.total(),
            profile = report.count(CascadeStep::Profile),
            menu = report.count(CascadeStep::Menu),
            submissions = report.count(CascadeStep::Submissions),
            subdomains = report.count(CascadeStep::SubdomainRegistry),
            public_menus = report.count(CascadeStep::PublicMenus),
            "Tenant deleted"
        );
        Ok(report)
    }

    /// Gather the delete sets for `uid` in step order.
    async fn collect(&self, uid: &Uid) -> Result<Vec<DeleteSet>, FunctionError> {
        let tenant = TenantId::owned_by(uid);

        let profile = self
            .partition(
                CascadeStep::Profile,
                layout::profile_root(&tenant)?,
                &[layout::PROFILE_DOCS, layout::SETTINGS],
            )
            .await?;
        let menu = self
            .partition(
                CascadeStep::Menu,
                layout::menu_root(&tenant)?,
                &[layout::CATEGORIES, layout::ITEMS],
            )
            .await?;
        let submissions = self
            .partition(
                CascadeStep::Submissions,
                layout::submissions_root(&tenant)?,
                &[layout::SUBMISSION_DATA],
            )
            .await?;
        let registry = self
            .owned_entries(CascadeStep::SubdomainRegistry, &layout::subdomains(), uid)
            .await?;
        let public_menus = self
            .owned_entries(CascadeStep::PublicMenus, &layout::public_menus(), uid)
            .await?;

        Ok(vec![profile, menu, submissions, registry, public_menus])
    }

    /// The root document and its listed sub-collections, if the root exists.
    ///
    /// Sub-collections of a missing root are left alone.
    async fn partition(
        &self,
        step: CascadeStep,
        root: DocPath,
        children: &[&'static str],
    ) -> Result<DeleteSet, FunctionError> {
        let mut set = DeleteSet::empty(step);
        if self.documents.get(&root).await?.is_none() {
            return Ok(set);
        }

        for &child in children {
            let docs = self.documents.list_collection(&root.collection(child)).await?;
            set.paths.extend(docs.into_iter().map(|d| d.path));
        }
        set.paths.push(root);
        Ok(set)
    }

    /// Every entry in a top-level index whose `userId` is `uid`.
    async fn owned_entries(
        &self,
        step: CascadeStep,
        collection: &CollectionPath,
        uid: &Uid,
    ) -> Result<DeleteSet, FunctionError> {
        let docs = self
            .documents
            .query_eq(collection, layout::USER_ID_FIELD, uid.as_str())
            .await?;
        Ok(DeleteSet {
            step,
            paths: docs.into_iter().map(|d| d.path).collect(),
        })
    }
}
