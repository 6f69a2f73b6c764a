//! The local key/value cache.
//!
//! Every component that mirrors remote data locally goes through
//! [`KeyValueCache`]; [`StudyCache`] is the typed view of the keys the
//! study log service uses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use musicschool_shared::models::{format_date, StudyLog};
use musicschool_shared::types::UserId;
use tracing::warn;

use crate::database::{lock, SharedDatabase};
use crate::error::{Result, StoreError};

const KEY_CURRENT_DAY_STUDY_TIME: &str = "current_day_study_time";
const KEY_PAST_STUDY_LOGS: &str = "past_study_logs";
const KEY_LAST_SYNC_DATE: &str = "last_sync_date";

/// Canonical cache interface: string values with typed helpers.
pub trait KeyValueCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&self, key: &str, value: &str) -> Result<()>;

    fn invalidate(&self, key: &str) -> Result<()>;

    fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key)? {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e: std::num::ParseIntError| StoreError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn put_i64(&self, key: &str, value: i64) -> Result<()> {
        self.put(key, &value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Process-local cache, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// Cache persisted in the `kv` table; survives restarts.
#[derive(Clone)]
pub struct SqliteCache {
    db: SharedDatabase,
}

impl SqliteCache {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }
}

impl KeyValueCache for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        lock(&self.db)?.kv_get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.db)?.kv_put(key, value)
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        lock(&self.db)?.kv_remove(key).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Study cache
// ---------------------------------------------------------------------------

/// Typed view over the study-log keys of a [`KeyValueCache`].
///
/// Reads never fail: a broken or missing entry is logged and reported as
/// absent, so the caller can still render something.
#[derive(Clone)]
pub struct StudyCache {
    inner: Arc<dyn KeyValueCache>,
}

impl StudyCache {
    pub fn new(inner: Arc<dyn KeyValueCache>) -> Self {
        Self { inner }
    }

    fn current_day_key(user_id: &UserId, date: NaiveDate) -> String {
        format!("{KEY_CURRENT_DAY_STUDY_TIME}-{user_id}-{}", format_date(date))
    }

    /// Last known total for `(user, date)`, `0` when unknown.
    pub fn current_day_time(&self, user_id: &UserId, date: NaiveDate) -> u64 {
        let key = Self::current_day_key(user_id, date);
        match self.inner.get_i64(&key) {
            Ok(Some(v)) => v.max(0) as u64,
            Ok(None) => 0,
            Err(e) => {
                warn!(key = %key, error = %e, "Unreadable cached study time");
                0
            }
        }
    }

    pub fn save_current_day_time(&self, user_id: &UserId, date: NaiveDate, total_millis: u64) {
        let key = Self::current_day_key(user_id, date);
        let value = i64::try_from(total_millis).unwrap_or(i64::MAX);
        if let Err(e) = self.inner.put_i64(&key, value) {
            warn!(key = %key, error = %e, "Failed to cache study time");
        }
    }

    /// Cached history list, empty when absent or unreadable.
    pub fn past_logs(&self) -> Vec<StudyLog> {
        let raw = match self.inner.get(KEY_PAST_STUDY_LOGS) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read cached study logs");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding corrupt cached study logs");
            Vec::new()
        })
    }

    pub fn save_past_logs(&self, logs: &[StudyLog]) {
        let result = serde_json::to_string(logs)
            .map_err(StoreError::from)
            .and_then(|json| self.inner.put(KEY_PAST_STUDY_LOGS, &json));
        if let Err(e) = result {
            warn!(error = %e, "Failed to cache study logs");
        }
    }

    pub fn invalidate_past_logs(&self) {
        if let Err(e) = self.inner.invalidate(KEY_PAST_STUDY_LOGS) {
            warn!(error = %e, "Failed to invalidate cached study logs");
        }
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        match self.inner.get_i64(KEY_LAST_SYNC_DATE) {
            Ok(Some(ms)) => DateTime::from_timestamp_millis(ms),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Unreadable last sync date");
                None
            }
        }
    }

    pub fn save_last_sync(&self, at: DateTime<Utc>) {
        if let Err(e) = self.inner.put_i64(KEY_LAST_SYNC_DATE, at.timestamp_millis()) {
            warn!(error = %e, "Failed to cache last sync date");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn memory_cache_typed_helpers() {
        let cache = MemoryCache::new();
        cache.put_i64("n", 42).unwrap();
        assert_eq!(cache.get_i64("n").unwrap(), Some(42));

        cache.put("n", "not a number").unwrap();
        assert!(matches!(cache.get_i64("n"), Err(StoreError::InvalidValue { .. })));

        cache.invalidate("n").unwrap();
        assert_eq!(cache.get("n").unwrap(), None);
    }

    #[test]
    fn study_cache_is_keyed_by_user_and_day() {
        let cache = StudyCache::new(Arc::new(MemoryCache::new()));
        let ana = UserId::new("ana");
        let bia = UserId::new("bia");

        cache.save_current_day_time(&ana, day(18), 90_000);
        assert_eq!(cache.current_day_time(&ana, day(18)), 90_000);
        assert_eq!(cache.current_day_time(&ana, day(17)), 0);
        assert_eq!(cache.current_day_time(&bia, day(18)), 0);
    }

    #[test]
    fn sqlite_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let ana = UserId::new("ana");
        let logs = vec![StudyLog::new(ana.clone(), day(17), 1_000)];
        let synced = DateTime::from_timestamp_millis(1_760_000_000_000).unwrap();

        {
            let db = Database::open_at(&path).unwrap().into_shared();
            let cache = StudyCache::new(Arc::new(SqliteCache::new(db)));
            cache.save_past_logs(&logs);
            cache.save_current_day_time(&ana, day(18), 5_000);
            cache.save_last_sync(synced);
        }

        let db = Database::open_at(&path).unwrap().into_shared();
        let cache = StudyCache::new(Arc::new(SqliteCache::new(db)));
        assert_eq!(cache.past_logs(), logs);
        assert_eq!(cache.current_day_time(&ana, day(18)), 5_000);
        assert_eq!(cache.last_sync(), Some(synced));

        cache.invalidate_past_logs();
        assert!(cache.past_logs().is_empty());
    }

    #[test]
    fn corrupt_history_reads_as_empty() {
        let inner = Arc::new(MemoryCache::new());
        inner.put(KEY_PAST_STUDY_LOGS, "{not json").unwrap();
        let cache = StudyCache::new(inner);
        assert!(cache.past_logs().is_empty());
    }
}
