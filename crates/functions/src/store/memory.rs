//! In-process stores for tests and local runs.
//!
//! Both stores are cheap to clone (shared state behind an `Arc`) and support
//! failure injection so callers can observe how services behave when a
//! write is refused.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Mutex;

use menuboard_core::{CustomClaims, Email, Uid};

use super::{
    CollectionPath, DocPath, Document, DocumentStore, IdentityStore, StoreError, UserRecord,
    WriteBatch, WriteOp,
};

/// Document store backed by an ordered map of path to JSON body.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<MemoryDocuments>,
}

#[derive(Default)]
struct MemoryDocuments {
    docs: Mutex<BTreeMap<DocPath, serde_json::Value>>,
    fail_commits: AtomicBool,
    commits: AtomicUsize,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent [`DocumentStore::commit`] fail without writing.
    pub fn fail_commits(&self, fail: bool) {
        self.inner.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of batch commits attempted so far (including failed ones).
    #[must_use]
    pub fn commit_attempts(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    /// Number of stored documents whose path starts with `prefix`.
    pub async fn count_prefix(&self, prefix: &str) -> usize {
        self.inner
            .docs
            .lock()
            .await
            .keys()
            .filter(|path| path.as_str().starts_with(prefix))
            .count()
    }

    /// Total number of stored documents.
    pub async fn len(&self) -> usize {
        self.inner.docs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        let docs = self.inner.docs.lock().await;
        Ok(docs.get(path).map(|data| Document {
            path: path.clone(),
            data: data.clone(),
        }))
    }

    async fn set(&self, path: &DocPath, data: serde_json::Value) -> Result<(), StoreError> {
        self.inner.docs.lock().await.insert(path.clone(), data);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        self.inner.docs.lock().await.remove(path);
        Ok(())
    }

    async fn list_collection(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, StoreError> {
        let docs = self.inner.docs.lock().await;
        Ok(docs
            .iter()
            .filter(|(path, _)| &path.parent() == collection)
            .map(|(path, data)| Document {
                path: path.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let matches = self
            .list_collection(collection)
            .await?
            .into_iter()
            .filter(|doc| doc.field_str(field) == Some(value))
            .collect();
        Ok(matches)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.inner.commits.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "batch commit rejected by store".to_owned(),
            ));
        }

        let mut docs = self.inner.docs.lock().await;
        for op in batch.ops() {
            match op {
                WriteOp::Set { path, data } => {
                    docs.insert(path.clone(), data.clone());
                }
                WriteOp::Delete { path } => {
                    docs.remove(path);
                }
            }
        }
        Ok(())
    }
}

/// Identity store backed by a map of uid to record.
#[derive(Clone, Default)]
pub struct MemoryIdentityStore {
    inner: Arc<MemoryIdentities>,
}

#[derive(Default)]
struct MemoryIdentities {
    users: Mutex<HashMap<Uid, UserRecord>>,
    fail_claim_writes: AtomicBool,
    fail_deletes: AtomicBool,
    user_reads: AtomicUsize,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent claims write fail.
    pub fn fail_claim_writes(&self, fail: bool) {
        self.inner.fail_claim_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent identity delete fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.inner.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of `get_user` calls served so far.
    #[must_use]
    pub fn user_reads(&self) -> usize {
        self.inner.user_reads.load(Ordering::SeqCst)
    }

    /// Insert a user together with an initial claim set.
    pub async fn insert(&self, uid: &str, email: Option<&str>, claims: Option<CustomClaims>) {
        let uid = Uid::new(uid);
        let record = UserRecord {
            uid: uid.clone(),
            email: email.and_then(|e| Email::parse(e).ok()),
            claims,
        };
        self.inner.users.lock().await.insert(uid, record);
    }
}

impl IdentityStore for MemoryIdentityStore {
    async fn get_user(&self, uid: &Uid) -> Result<Option<UserRecord>, StoreError> {
        self.inner.user_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.users.lock().await.get(uid).cloned())
    }

    async fn create_user(&self, uid: &Uid, email: Option<&Email>) -> Result<UserRecord, StoreError> {
        let record = UserRecord {
            uid: uid.clone(),
            email: email.cloned(),
            claims: None,
        };
        self.inner
            .users
            .lock()
            .await
            .insert(uid.clone(), record.clone());
        Ok(record)
    }

    async fn set_custom_claims(&self, uid: &Uid, claims: &CustomClaims) -> Result<(), StoreError> {
        if self.inner.fail_claim_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "identity service rejected claims update".to_owned(),
            ));
        }
        let mut users = self.inner.users.lock().await;
        let record = users
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(format!("no user record for uid {uid}")))?;
        record.claims = Some(claims.clone());
        Ok(())
    }

    async fn delete_user(&self, uid: &Uid) -> Result<(), StoreError> {
        if self.inner.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "identity service rejected user deletion".to_owned(),
            ));
        }
        self.inner
            .users
            .lock()
            .await
            .remove(uid)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("no user record for uid {uid}")))
    }
}
