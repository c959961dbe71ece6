//! The subdomain registry: which store answers on which subdomain.
//!
//! Entries live under auto-generated ids, so nothing in the store enforces
//! uniqueness. [`SubdomainRegistry::claim`] checks then writes; two claims
//! racing on the same name can both succeed, and [`SubdomainRegistry::lookup`]
//! then resolves to whichever entry lists first.

use chrono::Utc;
use tracing::{info, instrument};

use menuboard_core::{RegistryEntry, Subdomain, Uid};

use crate::error::FunctionError;
use crate::store::{DocumentStore, layout};

#[derive(Clone)]
pub struct SubdomainRegistry<D> {
    documents: D,
}

impl<D: DocumentStore> SubdomainRegistry<D> {
    pub const fn new(documents: D) -> Self {
        Self { documents }
    }

    /// Whether no entry holds `subdomain`.
    ///
    /// # Errors
    ///
    /// `Internal` if the document store fails.
    pub async fn is_available(&self, subdomain: &Subdomain) -> Result<bool, FunctionError> {
        let hits = self
            .documents
            .query_eq(
                &layout::subdomains(),
                layout::SUBDOMAIN_FIELD,
                subdomain.as_str(),
            )
            .await?;
        Ok(hits.is_empty())
    }

    /// Write a new entry mapping `subdomain` to `uid`, without checking.
    ///
    /// # Errors
    ///
    /// `Internal` if the document store fails.
    pub async fn register(
        &self,
        subdomain: &Subdomain,
        uid: &Uid,
    ) -> Result<RegistryEntry, FunctionError> {
        let entry = RegistryEntry {
            subdomain: subdomain.clone(),
            user_id: uid.clone(),
            created_at: Utc::now(),
        };
        let id = uuid::Uuid::new_v4().simple().to_string();
        let body = serde_json::to_value(&entry)
            .map_err(|e| FunctionError::Internal(format!("failed to encode entry: {e}")))?;
        self.documents
            .set(&layout::subdomains().doc(&id)?, body)
            .await?;
        Ok(entry)
    }

    /// Register `subdomain` for `uid` if nobody holds it yet.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the subdomain is taken, `Internal` if the
    /// document store fails.
    #[instrument(skip(self), fields(subdomain = %subdomain, uid = %uid))]
    pub async fn claim(
        &self,
        subdomain: &Subdomain,
        uid: &Uid,
    ) -> Result<RegistryEntry, FunctionError> {
        if !self.is_available(subdomain).await? {
            return Err(FunctionError::InvalidArgument(format!(
                "subdomain {subdomain} is already taken"
            )));
        }
        let entry = self.register(subdomain, uid).await?;
        info!("Subdomain claimed");
        Ok(entry)
    }

    /// The owner of `subdomain`, if any.
    ///
    /// # Errors
    ///
    /// `Internal` if the document store fails or an entry is malformed.
    pub async fn lookup(&self, subdomain: &Subdomain) -> Result<Option<Uid>, FunctionError> {
        let hits = self
            .documents
            .query_eq(
                &layout::subdomains(),
                layout::SUBDOMAIN_FIELD,
                subdomain.as_str(),
            )
            .await?;
        Ok(hits
            .first()
            .map(|doc| doc.decode::<RegistryEntry>())
            .transpose()?
            .map(|entry| entry.user_id))
    }
}
