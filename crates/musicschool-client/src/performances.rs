//! Published performance links, newest first.

use std::sync::Arc;

use chrono::Utc;
use musicschool_backend::document::query_typed;
use musicschool_backend::{BackendError, Direction, DocumentStore, Query};
use musicschool_shared::constants::COLLECTION_PERFORMANCES;
use musicschool_shared::models::{AuthUser, Performance};
use musicschool_shared::validation::validate_performance;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::subscription::Observable;

pub struct PerformanceFeed {
    store: Arc<dyn DocumentStore>,
    feed: Observable<Vec<Performance>>,
}

impl PerformanceFeed {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            feed: Observable::new(Vec::new()),
        }
    }

    pub fn feed(&self) -> &Observable<Vec<Performance>> {
        &self.feed
    }

    pub async fn publish(&self, user: &AuthUser, title: &str, video_link: &str) -> Result<Performance> {
        let (title, video_link) = validate_performance(title, video_link)?;
        let performance = Performance {
            id: Uuid::new_v4(),
            user_id: user.uid.clone(),
            username: user.email.clone(),
            title,
            video_link,
            published_at: Utc::now(),
        };

        let fields = serde_json::to_value(&performance).map_err(BackendError::from)?;
        self.store
            .set(COLLECTION_PERFORMANCES, &performance.id.to_string(), fields)
            .await?;

        info!(id = %performance.id, user = %user.uid.short(), "performance published");
        let added = performance.clone();
        self.feed.update(|list| list.insert(0, added));
        Ok(performance)
    }

    /// Reload the feed. On failure the current list is kept.
    pub async fn list(&self) -> Vec<Performance> {
        let query = Query::collection(COLLECTION_PERFORMANCES)
            .order_by("publishedAt", Direction::Descending);
        match query_typed::<Performance>(self.store.as_ref(), &query).await {
            Ok(list) => {
                self.feed.publish(list.clone());
                list
            }
            Err(e) => {
                warn!(error = %e, "Failed to load performances");
                self.feed.get()
            }
        }
    }
}
