//! Embedded backend: the document store and auth provider traits
//! implemented on the local SQLite database.
//!
//! Lets the application run on a single device without a managed backend.
//! Queries are evaluated in process over the collection's rows.

use async_trait::async_trait;
use musicschool_backend::auth::{normalize_email, AccountRecord, AuthError, AuthProvider};
use musicschool_backend::document::{resolve_server_timestamps, CommitClock, Document, DocumentStore};
use musicschool_backend::{BackendError, Query};
use musicschool_shared::models::AuthUser;
use serde_json::Value;
use tracing::{debug, info};

use crate::database::{lock, SharedDatabase};
use crate::error::StoreError;

impl From<StoreError> for BackendError {
    fn from(e: StoreError) -> Self {
        BackendError::Storage(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Document store
// ---------------------------------------------------------------------------

pub struct SqliteDocumentStore {
    db: SharedDatabase,
    clock: CommitClock,
}

impl SqliteDocumentStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self {
            db,
            clock: CommitClock::new(),
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> musicschool_backend::Result<Option<Document>> {
        let fields = lock(&self.db)?.get_document(collection, id)?;
        Ok(fields.map(|fields| Document {
            id: id.to_string(),
            fields,
        }))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        mut fields: Value,
    ) -> musicschool_backend::Result<Document> {
        resolve_server_timestamps(&mut fields, self.clock.next())?;
        lock(&self.db)?.put_document(collection, id, &fields)?;
        debug!(collection, id, "document written");
        Ok(Document {
            id: id.to_string(),
            fields,
        })
    }

    async fn query(&self, query: &Query) -> musicschool_backend::Result<Vec<Document>> {
        let rows = lock(&self.db)?.list_documents(&query.collection)?;
        Ok(query.apply(
            rows.into_iter()
                .map(|(id, fields)| Document { id, fields }),
        ))
    }
}

// ---------------------------------------------------------------------------
// Auth provider
// ---------------------------------------------------------------------------

/// Accounts stored in the `accounts` table; the signed-in account is
/// remembered across restarts.
pub struct SqliteAuthProvider {
    db: SharedDatabase,
}

impl SqliteAuthProvider {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }
}

fn backend_err(e: StoreError) -> AuthError {
    AuthError::Backend(e.to_string())
}

#[async_trait]
impl AuthProvider for SqliteAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let account = AccountRecord::create(email, password)?;

        let db = lock(&self.db).map_err(backend_err)?;
        if !db.insert_account(&account).map_err(backend_err)? {
            return Err(AuthError::UserCollision);
        }
        db.set_session(&account.email).map_err(backend_err)?;

        info!(uid = %account.uid, "account created");
        Ok(account.to_user())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email)?;

        let db = lock(&self.db).map_err(backend_err)?;
        let account = match db.get_account(&email) {
            Ok(account) => account,
            Err(StoreError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(backend_err(e)),
        };
        if !account.verify(password) {
            return Err(AuthError::InvalidCredentials);
        }
        db.set_session(&account.email).map_err(backend_err)?;

        info!(uid = %account.uid, "signed in");
        Ok(account.to_user())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        lock(&self.db)
            .and_then(|db| db.clear_session())
            .map_err(backend_err)
    }

    async fn current_user(&self) -> Option<AuthUser> {
        let session = lock(&self.db).and_then(|db| db.get_session());
        match session {
            Ok(account) => account.map(|a| a.to_user()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read auth session");
                None
            }
        }
    }
}
