//! Storage seams: the tenant document store and the identity & claims store.
//!
//! Both are traits so the services can run against Postgres in production
//! and against the in-memory stores in tests. [`DocumentBackend`] and
//! [`IdentityBackend`] pick one implementation at startup so the HTTP layer
//! stays non-generic.

pub mod layout;
pub mod memory;
pub mod path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use menuboard_core::{CustomClaims, Email, Uid};

use crate::db::{PgDocumentStore, PgIdentityStore};

pub use memory::{MemoryDocumentStore, MemoryIdentityStore};
pub use path::{CollectionPath, DocPath, PathError};

/// Errors that can occur in either store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The addressed record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record with the same key already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store refused or failed the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A path was built from invalid input.
    #[error("invalid path: {0}")]
    Path(#[from] PathError),
}

/// A stored document and its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub data: serde_json::Value,
}

impl Document {
    /// Decode the document body into a typed shape.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataCorruption` if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| StoreError::DataCorruption(format!("{}: {e}", self.path)))
    }

    /// String value of a top-level field, if present.
    #[must_use]
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(serde_json::Value::as_str)
    }
}

/// One write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        path: DocPath,
        data: serde_json::Value,
    },
    Delete {
        path: DocPath,
    },
}

impl WriteOp {
    /// The document this write touches.
    #[must_use]
    pub const fn path(&self) -> &DocPath {
        match self {
            Self::Set { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// Writes applied together by [`DocumentStore::commit`]: all or nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// An empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full overwrite of `path`.
    pub fn set(&mut self, path: DocPath, data: serde_json::Value) -> &mut Self {
        self.ops.push(WriteOp::Set { path, data });
        self
    }

    /// Queue a delete of `path`.
    pub fn delete(&mut self, path: DocPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    /// Queued writes in order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// An identity record as held by the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: Uid,
    pub email: Option<Email>,
    /// `None` until a role has been assigned.
    pub claims: Option<CustomClaims>,
}

/// Hierarchical document store.
pub trait DocumentStore: Send + Sync {
    /// Read one document.
    fn get(
        &self,
        path: &DocPath,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Create or fully overwrite one document.
    fn set(
        &self,
        path: &DocPath,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete one document. Deleting a missing document is not an error.
    fn delete(&self, path: &DocPath) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every document directly inside `collection`.
    fn list_collection(
        &self,
        collection: &CollectionPath,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Documents in `collection` whose string field `field` equals `value`.
    fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Apply every write in `batch` atomically.
    fn commit(&self, batch: WriteBatch) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Identity & claims directory.
pub trait IdentityStore: Send + Sync {
    /// Read a user's identity record.
    fn get_user(&self, uid: &Uid)
    -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Register a new identity without claims.
    fn create_user(
        &self,
        uid: &Uid,
        email: Option<&Email>,
    ) -> impl Future<Output = Result<UserRecord, StoreError>> + Send;

    /// Replace the user's entire claim set.
    ///
    /// Fails with `StoreError::NotFound` if the user does not exist.
    fn set_custom_claims(
        &self,
        uid: &Uid,
        claims: &CustomClaims,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove the identity record.
    ///
    /// Fails with `StoreError::NotFound` if the user does not exist.
    fn delete_user(&self, uid: &Uid) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The document store selected at startup.
#[derive(Clone)]
pub enum DocumentBackend {
    Postgres(PgDocumentStore),
    Memory(MemoryDocumentStore),
}

impl DocumentStore for DocumentBackend {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        match self {
            Self::Postgres(s) => s.get(path).await,
            Self::Memory(s) => s.get(path).await,
        }
    }

    async fn set(&self, path: &DocPath, data: serde_json::Value) -> Result<(), StoreError> {
        match self {
            Self::Postgres(s) => s.set(path, data).await,
            Self::Memory(s) => s.set(path, data).await,
        }
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        match self {
            Self::Postgres(s) => s.delete(path).await,
            Self::Memory(s) => s.delete(path).await,
        }
    }

    async fn list_collection(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, StoreError> {
        match self {
            Self::Postgres(s) => s.list_collection(collection).await,
            Self::Memory(s) => s.list_collection(collection).await,
        }
    }

    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        match self {
            Self::Postgres(s) => s.query_eq(collection, field, value).await,
            Self::Memory(s) => s.query_eq(collection, field, value).await,
        }
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        match self {
            Self::Postgres(s) => s.commit(batch).await,
            Self::Memory(s) => s.commit(batch).await,
        }
    }
}

/// The identity store selected at startup.
#[derive(Clone)]
pub enum IdentityBackend {
    Postgres(PgIdentityStore),
    Memory(MemoryIdentityStore),
}

impl IdentityStore for IdentityBackend {
    async fn get_user(&self, uid: &Uid) -> Result<Option<UserRecord>, StoreError> {
        match self {
            Self::Postgres(s) => s.get_user(uid).await,
            Self::Memory(s) => s.get_user(uid).await,
        }
    }

    async fn create_user(&self, uid: &Uid, email: Option<&Email>) -> Result<UserRecord, StoreError> {
        match self {
            Self::Postgres(s) => s.create_user(uid, email).await,
            Self::Memory(s) => s.create_user(uid, email).await,
        }
    }

    async fn set_custom_claims(&self, uid: &Uid, claims: &CustomClaims) -> Result<(), StoreError> {
        match self {
            Self::Postgres(s) => s.set_custom_claims(uid, claims).await,
            Self::Memory(s) => s.set_custom_claims(uid, claims).await,
        }
    }

    async fn delete_user(&self, uid: &Uid) -> Result<(), StoreError> {
        match self {
            Self::Postgres(s) => s.delete_user(uid).await,
            Self::Memory(s) => s.delete_user(uid).await,
        }
    }
}
