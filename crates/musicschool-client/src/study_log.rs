//! Daily study totals: remote documents mirrored into the local cache.

use std::sync::Arc;

use chrono::NaiveDate;
use musicschool_backend::document::{encode_with_server_timestamp, get_typed, query_typed};
use musicschool_backend::{Direction, DocumentStore, Query};
use musicschool_shared::constants::COLLECTION_STUDY_LOGS;
use musicschool_shared::models::{format_date, StudyLog};
use musicschool_shared::types::UserId;
use musicschool_store::StudyCache;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::subscription::Observable;

pub struct StudyLogStore {
    store: Arc<dyn DocumentStore>,
    cache: StudyCache,
    clock: Arc<dyn Clock>,
    history: Observable<Vec<StudyLog>>,
    today_total: Observable<u64>,
}

impl StudyLogStore {
    pub fn new(store: Arc<dyn DocumentStore>, cache: StudyCache, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache,
            clock,
            history: Observable::new(Vec::new()),
            today_total: Observable::new(0),
        }
    }

    /// History list, newest day first.
    pub fn history(&self) -> &Observable<Vec<StudyLog>> {
        &self.history
    }

    /// Total studied today by the loaded user.
    pub fn today_total(&self) -> &Observable<u64> {
        &self.today_total
    }

    /// Fill the observable state from the cache before any remote fetch.
    pub fn load_cached(&self, user_id: &UserId, today: NaiveDate) {
        self.today_total
            .publish(self.cache.current_day_time(user_id, today));
        let logs = self.cached_logs(user_id, NaiveDate::MIN);
        debug!(count = logs.len(), "study logs loaded from cache");
        self.history.publish(logs);
    }

    /// Cached logs of `user_id` from `since` onwards, newest first.
    fn cached_logs(&self, user_id: &UserId, since: NaiveDate) -> Vec<StudyLog> {
        let mut logs: Vec<StudyLog> = self
            .cache
            .past_logs()
            .into_iter()
            .filter(|l| &l.user_id == user_id && l.date >= since)
            .collect();
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        logs
    }

    /// Last total written locally for `(user, date)`.
    pub fn cached_total(&self, user_id: &UserId, date: NaiveDate) -> u64 {
        self.cache.current_day_time(user_id, date)
    }

    /// Insert or overwrite the `(user, date)` total.
    ///
    /// The cache and the history list are updated before the remote write,
    /// so they keep the new total when the write fails.
    pub async fn upsert(&self, user_id: &UserId, date: NaiveDate, total_time_millis: u64) -> Result<StudyLog> {
        self.cache
            .save_current_day_time(user_id, date, total_time_millis);
        if date == self.clock.today() {
            self.today_total.publish(total_time_millis);
        }

        let mut log = StudyLog::new(user_id.clone(), date, total_time_millis);
        self.merge_into_history(log.clone());

        let id = StudyLog::document_id(user_id, date);
        let fields = encode_with_server_timestamp(&log, "timestamp")?;
        match self.store.set(COLLECTION_STUDY_LOGS, &id, fields).await {
            Ok(doc) => {
                log = doc.decode()?;
                self.merge_into_history(log.clone());
                info!(id = %id, total_time_millis, "study log saved");
                Ok(log)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to save study log, kept locally");
                Err(e.into())
            }
        }
    }

    fn merge_into_history(&self, log: StudyLog) {
        let mut merged = Vec::new();
        self.history.update(|logs| {
            match logs
                .iter_mut()
                .find(|l| l.date == log.date && l.user_id == log.user_id)
            {
                Some(existing) => *existing = log,
                None => {
                    logs.push(log);
                    logs.sort_by(|a, b| b.date.cmp(&a.date));
                }
            }
            merged = logs.clone();
        });
        self.cache.save_past_logs(&merged);
    }

    /// Logs of `user_id` from `since` onwards, newest first.
    ///
    /// On remote failure the cached list is returned, restricted to the same
    /// user and window.
    pub async fn query_recent(&self, user_id: &UserId, since: NaiveDate) -> Vec<StudyLog> {
        let query = Query::collection(COLLECTION_STUDY_LOGS)
            .where_eq("userId", user_id.as_str())
            .where_gte("date", format_date(since))
            .order_by("date", Direction::Descending);

        match query_typed::<StudyLog>(self.store.as_ref(), &query).await {
            Ok(logs) => {
                debug!(count = logs.len(), since = %since, "study logs fetched");
                self.cache.save_past_logs(&logs);
                self.cache.save_last_sync(self.clock.now());
                self.history.publish(logs.clone());
                logs
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch study logs, serving cache");
                let logs = self.cached_logs(user_id, since);
                self.history.publish(logs.clone());
                logs
            }
        }
    }

    /// Today's total from the store, falling back to the cached value.
    pub async fn load_today(&self, user_id: &UserId, today: NaiveDate) -> u64 {
        let id = StudyLog::document_id(user_id, today);
        let total = match get_typed::<StudyLog>(self.store.as_ref(), COLLECTION_STUDY_LOGS, &id).await {
            Ok(log) => {
                let total = log.map_or(0, |l| l.total_time_millis);
                self.cache.save_current_day_time(user_id, today, total);
                total
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to load today's study log, serving cache");
                self.cache.current_day_time(user_id, today)
            }
        };
        self.today_total.publish(total);
        total
    }

    /// When the history was last refreshed from the store.
    pub fn last_sync(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.cache.last_sync()
    }

    /// Forget the loaded user's history, e.g. on sign-out.
    pub fn clear(&self) {
        self.cache.invalidate_past_logs();
        self.history.publish(Vec::new());
        self.today_total.publish(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use musicschool_backend::MemoryDocumentStore;
    use musicschool_store::MemoryCache;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn fixture() -> (Arc<MemoryDocumentStore>, StudyCache, StudyLogStore) {
        let remote = Arc::new(MemoryDocumentStore::new());
        let cache = StudyCache::new(Arc::new(MemoryCache::new()));
        let store = StudyLogStore::new(
            remote.clone(),
            cache.clone(),
            Arc::new(FixedClock::at_day(day(18))),
        );
        (remote, cache, store)
    }

    #[tokio::test]
    async fn upsert_replaces_same_day() {
        let (_, cache, store) = fixture();
        let ana = UserId::new("ana");

        store.upsert(&ana, day(18), 1_000).await.unwrap();
        let saved = store.upsert(&ana, day(18), 2_500).await.unwrap();
        assert!(saved.timestamp.is_some());

        let history = store.history().get();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total_time_millis, 2_500);
        assert_eq!(cache.current_day_time(&ana, day(18)), 2_500);
        assert_eq!(store.today_total().get(), 2_500);
        assert_eq!(cache.past_logs(), history);
    }

    #[tokio::test]
    async fn upsert_keeps_history_sorted_descending() {
        let (_, _, store) = fixture();
        let ana = UserId::new("ana");
        for d in [15, 18, 16] {
            store.upsert(&ana, day(d), 60_000).await.unwrap();
        }
        let dates: Vec<_> = store.history().get().iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![day(18), day(16), day(15)]);
    }

    #[tokio::test]
    async fn failed_upsert_keeps_local_state() {
        let (remote, cache, store) = fixture();
        let ana = UserId::new("ana");
        remote.set_offline(true);

        assert!(store.upsert(&ana, day(18), 4_000).await.is_err());
        assert_eq!(cache.current_day_time(&ana, day(18)), 4_000);
        assert_eq!(store.history().get()[0].total_time_millis, 4_000);
    }

    #[tokio::test]
    async fn query_recent_filters_by_user_and_window() {
        let (_, cache, store) = fixture();
        let ana = UserId::new("ana");
        let bia = UserId::new("bia");
        store.upsert(&ana, day(10), 1).await.unwrap();
        store.upsert(&ana, day(12), 2).await.unwrap();
        store.upsert(&ana, day(17), 3).await.unwrap();
        store.upsert(&bia, day(17), 4).await.unwrap();

        let logs = store.query_recent(&ana, day(11)).await;
        let totals: Vec<_> = logs.iter().map(|l| l.total_time_millis).collect();
        assert_eq!(totals, vec![3, 2]);
        assert_eq!(cache.past_logs(), logs);
        assert!(store.last_sync().is_some());
    }

    #[tokio::test]
    async fn query_recent_falls_back_to_filtered_cache() {
        let (remote, cache, store) = fixture();
        let ana = UserId::new("ana");
        let bia = UserId::new("bia");
        cache.save_past_logs(&[
            StudyLog::new(ana.clone(), day(17), 3),
            StudyLog::new(bia.clone(), day(16), 9),
            StudyLog::new(ana.clone(), day(1), 1),
        ]);
        remote.set_offline(true);

        let logs = store.query_recent(&ana, day(11)).await;
        assert_eq!(logs, vec![StudyLog::new(ana, day(17), 3)]);
        assert!(store.last_sync().is_none());
    }

    #[tokio::test]
    async fn load_today_prefers_remote_then_cache() {
        let (remote, cache, store) = fixture();
        let ana = UserId::new("ana");

        assert_eq!(store.load_today(&ana, day(18)).await, 0);

        store.upsert(&ana, day(18), 7_000).await.unwrap();
        cache.save_current_day_time(&ana, day(18), 1);
        assert_eq!(store.load_today(&ana, day(18)).await, 7_000);
        assert_eq!(cache.current_day_time(&ana, day(18)), 7_000);

        remote.set_offline(true);
        cache.save_current_day_time(&ana, day(18), 8_000);
        assert_eq!(store.load_today(&ana, day(18)).await, 8_000);
    }

    #[tokio::test]
    async fn load_cached_restores_state() {
        let (_, cache, store) = fixture();
        let ana = UserId::new("ana");
        cache.save_current_day_time(&ana, day(18), 42);
        cache.save_past_logs(&[StudyLog::new(ana.clone(), day(17), 5)]);

        store.load_cached(&ana, day(18));
        assert_eq!(store.today_total().get(), 42);
        assert_eq!(store.history().get().len(), 1);
    }

    #[tokio::test]
    async fn load_cached_shows_only_that_user() {
        let (_, cache, store) = fixture();
        let ana = UserId::new("ana");
        let bia = UserId::new("bia");
        cache.save_past_logs(&[
            StudyLog::new(bia.clone(), day(17), 9),
            StudyLog::new(ana.clone(), day(15), 1),
            StudyLog::new(ana.clone(), day(16), 2),
        ]);

        store.load_cached(&ana, day(18));
        assert_eq!(
            store.history().get(),
            vec![StudyLog::new(ana.clone(), day(16), 2), StudyLog::new(ana, day(15), 1)]
        );
    }

    #[tokio::test]
    async fn clear_drops_cached_history() {
        let (_, cache, store) = fixture();
        let ana = UserId::new("ana");
        store.upsert(&ana, day(18), 3_000).await.unwrap();

        store.clear();
        assert!(store.history().get().is_empty());
        assert_eq!(store.today_total().get(), 0);
        assert!(cache.past_logs().is_empty());
        assert_eq!(store.cached_total(&ana, day(18)), 3_000);
    }
}
