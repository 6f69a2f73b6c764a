//! In-memory backend.
//!
//! Used by tests and demos. Both types can be switched offline to exercise
//! the degrade-on-failure paths of the client, and the document store can
//! delay reads to simulate network latency.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use musicschool_shared::models::AuthUser;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::{normalize_email, AccountRecord, AuthError, AuthProvider};
use crate::document::{resolve_server_timestamps, CommitClock, Document, DocumentStore};
use crate::error::{BackendError, Result};
use crate::query::Query;

// ---------------------------------------------------------------------------
// Document store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredDoc {
    /// Write sequence of the first insert; keeps storage order stable.
    seq: u64,
    fields: Value,
}

/// Document store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, BTreeMap<String, StoredDoc>>>,
    clock: CommitClock,
    next_seq: AtomicU64,
    offline: AtomicBool,
    read_latency_ms: AtomicU64,
    reads: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`BackendError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay applied to every `get` and `query`.
    pub fn set_read_latency(&self, latency: Duration) {
        self.read_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `get`/`query` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("memory backend is offline".into()));
        }
        Ok(())
    }

    async fn simulate_read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let latency = self.read_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        self.check_online()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.simulate_read().await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| Document {
                id: id.to_string(),
                fields: stored.fields.clone(),
            }))
    }

    async fn set(&self, collection: &str, id: &str, mut fields: Value) -> Result<Document> {
        self.check_online()?;
        resolve_server_timestamps(&mut fields, self.clock.next())?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        let seq = docs
            .get(id)
            .map(|d| d.seq)
            .unwrap_or_else(|| self.next_seq.fetch_add(1, Ordering::SeqCst));
        docs.insert(
            id.to_string(),
            StoredDoc {
                seq,
                fields: fields.clone(),
            },
        );

        debug!(collection, id, "document written");
        Ok(Document {
            id: id.to_string(),
            fields,
        })
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        self.simulate_read().await?;
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut ordered: Vec<(&String, &StoredDoc)> = docs.iter().collect();
        ordered.sort_by_key(|(_, d)| d.seq);

        Ok(query.apply(ordered.into_iter().map(|(id, d)| Document {
            id: id.clone(),
            fields: d.fields.clone(),
        })))
    }
}

// ---------------------------------------------------------------------------
// Auth provider
// ---------------------------------------------------------------------------

/// Email/password accounts kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
    accounts: RwLock<HashMap<String, AccountRecord>>,
    current: RwLock<Option<AuthUser>>,
    offline: AtomicBool,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> std::result::Result<(), AuthError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AuthError::Backend("memory auth provider is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError> {
        self.check_online()?;
        let account = AccountRecord::create(email, password)?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.email) {
            return Err(AuthError::UserCollision);
        }
        let user = account.to_user();
        accounts.insert(account.email.clone(), account);
        drop(accounts);

        *self.current.write().await = Some(user.clone());
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError> {
        self.check_online()?;
        let email = normalize_email(email)?;

        let accounts = self.accounts.read().await;
        let user = match accounts.get(&email) {
            Some(account) if account.verify(password) => account.to_user(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        drop(accounts);

        *self.current.write().await = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> std::result::Result<(), AuthError> {
        *self.current.write().await = None;
        Ok(())
    }

    async fn current_user(&self) -> Option<AuthUser> {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::server_timestamp;
    use crate::query::Direction;
    use serde_json::json;

    #[tokio::test]
    async fn set_overwrites_and_get_reads_back() {
        let store = MemoryDocumentStore::new();
        store.set("c", "1", json!({"v": 1})).await.unwrap();
        store.set("c", "1", json!({"v": 2})).await.unwrap();

        let doc = store.get("c", "1").await.unwrap().unwrap();
        assert_eq!(doc.fields["v"], 2);
        assert!(store.get("c", "missing").await.unwrap().is_none());
        assert!(store.get("other", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_timestamps_order_writes() {
        let store = MemoryDocumentStore::new();
        for i in 0..5 {
            store
                .set("m", &format!("id{}", 4 - i), json!({"n": i, "timestamp": server_timestamp()}))
                .await
                .unwrap();
        }

        let q = Query::collection("m").order_by("timestamp", Direction::Ascending);
        let ns: Vec<i64> = store
            .query(&q)
            .await
            .unwrap()
            .iter()
            .map(|d| d.fields["n"].as_i64().unwrap())
            .collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryDocumentStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.get("c", "1").await,
            Err(BackendError::Unavailable(_))
        ));
        assert!(store.set("c", "1", json!({})).await.is_err());
        assert!(store.query(&Query::collection("c")).await.is_err());
    }

    #[tokio::test]
    async fn auth_taxonomy() {
        let auth = MemoryAuthProvider::new();
        let user = auth.sign_up("ana@school.org", "secret1").await.unwrap();
        assert_eq!(auth.current_user().await, Some(user.clone()));

        assert_eq!(
            auth.sign_up("ANA@school.org", "another1").await.unwrap_err(),
            AuthError::UserCollision
        );
        assert_eq!(
            auth.sign_up("bia@school.org", "123").await.unwrap_err(),
            AuthError::WeakPassword
        );

        auth.sign_out().await.unwrap();
        assert!(auth.current_user().await.is_none());

        assert_eq!(
            auth.sign_in("ana@school.org", "wrong-pass").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        let again = auth.sign_in("ana@school.org", "secret1").await.unwrap();
        assert_eq!(again.uid, user.uid);
    }
}
