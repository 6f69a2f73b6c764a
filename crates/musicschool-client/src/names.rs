//! Display-name lookup for chat senders.
//!
//! Names come from the sender's profile and are cached under
//! `sender_name:{uid}` in the shared key/value cache.

use std::sync::Arc;

use musicschool_shared::constants::UNKNOWN_SENDER_NAME;
use musicschool_shared::types::UserId;
use musicschool_store::KeyValueCache;
use tracing::{debug, warn};

use crate::profile::ProfileStore;

#[derive(Clone)]
pub struct NameResolver {
    cache: Arc<dyn KeyValueCache>,
    profiles: ProfileStore,
}

impl NameResolver {
    pub fn new(cache: Arc<dyn KeyValueCache>, profiles: ProfileStore) -> Self {
        Self { cache, profiles }
    }

    fn key(user_id: &UserId) -> String {
        format!("sender_name:{user_id}")
    }

    /// Cached name, then profile full name, then a placeholder. Never fails.
    pub async fn resolve(&self, user_id: &UserId) -> String {
        let key = Self::key(user_id);
        match self.cache.get(&key) {
            Ok(Some(name)) if !name.is_empty() => return name,
            Ok(_) => {}
            Err(e) => warn!(key = %key, error = %e, "Failed to read cached sender name"),
        }

        match self.profiles.load(user_id).await {
            Ok(Some(profile)) if !profile.full_name.is_empty() => {
                if let Err(e) = self.cache.put(&key, &profile.full_name) {
                    warn!(key = %key, error = %e, "Failed to cache sender name");
                }
                profile.full_name
            }
            Ok(_) => {
                debug!(user = %user_id.short(), "sender has no profile");
                UNKNOWN_SENDER_NAME.to_string()
            }
            Err(e) => {
                warn!(user = %user_id.short(), error = %e, "Failed to resolve sender name");
                UNKNOWN_SENDER_NAME.to_string()
            }
        }
    }

    /// Drop the cached name, e.g. after the user edits their profile.
    pub fn forget(&self, user_id: &UserId) {
        if let Err(e) = self.cache.invalidate(&Self::key(user_id)) {
            warn!(error = %e, "Failed to invalidate cached sender name");
        }
    }
}
