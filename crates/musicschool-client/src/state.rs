//! Application state shared by every command.
//!
//! [`AppState`] wires the client services to one backend: the embedded
//! SQLite backend for real use, or the in-memory one for tests and demos.

use std::sync::Arc;

use musicschool_backend::{AuthProvider, DocumentStore, MemoryAuthProvider, MemoryDocumentStore};
use musicschool_store::{
    Database, KeyValueCache, MemoryCache, SqliteAuthProvider, SqliteCache, SqliteDocumentStore,
    StudyCache,
};
use tracing::info;

use crate::auth::AuthSession;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::groups::GroupStore;
use crate::names::NameResolver;
use crate::performances::PerformanceFeed;
use crate::profile::ProfileStore;
use crate::study_log::StudyLogStore;
use crate::timer::SessionTimer;

/// The three services a backend has to provide.
#[derive(Clone)]
pub struct Backend {
    pub documents: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub cache: Arc<dyn KeyValueCache>,
}

impl Backend {
    /// Everything in one SQLite file under the configured data directory.
    pub fn sqlite(config: &ClientConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(musicschool_store::StoreError::from)?;
        let db = Database::open_at(&config.database_path())?.into_shared();
        Ok(Self {
            documents: Arc::new(SqliteDocumentStore::new(db.clone())),
            auth: Arc::new(SqliteAuthProvider::new(db.clone())),
            cache: Arc::new(SqliteCache::new(db)),
        })
    }

    pub fn memory() -> Self {
        Self {
            documents: Arc::new(MemoryDocumentStore::new()),
            auth: Arc::new(MemoryAuthProvider::new()),
            cache: Arc::new(MemoryCache::new()),
        }
    }
}

/// Central application state.
pub struct AppState {
    pub config: ClientConfig,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthSession,
    pub profiles: ProfileStore,
    pub names: NameResolver,
    pub dashboard: Dashboard,
    pub groups: GroupStore,
    pub performances: PerformanceFeed,
}

impl AppState {
    pub fn new(config: ClientConfig, backend: Backend, clock: Arc<dyn Clock>) -> Self {
        let profiles = ProfileStore::new(backend.documents.clone());
        let names = NameResolver::new(backend.cache.clone(), profiles.clone());
        let study_logs = StudyLogStore::new(
            backend.documents.clone(),
            StudyCache::new(backend.cache.clone()),
            clock.clone(),
        );
        let dashboard = Dashboard::new(
            SessionTimer::new(config.tick_interval),
            study_logs,
            profiles.clone(),
            clock.clone(),
            config.history_days,
        );

        Self {
            auth: AuthSession::new(backend.auth.clone()),
            groups: GroupStore::new(backend.documents.clone(), names.clone()),
            performances: PerformanceFeed::new(backend.documents),
            profiles,
            names,
            dashboard,
            clock,
            config,
        }
    }

    /// State backed by the SQLite database in `config.data_dir`.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let backend = Backend::sqlite(&config)?;
        info!(data_dir = %config.data_dir.display(), "application state opened");
        Ok(Self::new(config, backend, Arc::new(SystemClock)))
    }

    /// Restore the remembered session and load the signed-in user's data.
    pub async fn startup(&self) {
        if let Some(user) = self.auth.restore().await {
            self.dashboard.refresh(&user.uid).await;
            self.groups.refresh_groups().await;
            self.performances.list().await;
        }
    }
}
