//! Student profiles, one document per user id.

use std::sync::Arc;

use musicschool_backend::document::get_typed;
use musicschool_backend::DocumentStore;
use musicschool_shared::constants::COLLECTION_USER_PROFILES;
use musicschool_shared::models::UserProfile;
use musicschool_shared::types::UserId;
use tracing::{info, warn};

use crate::error::Result;

#[derive(Clone)]
pub struct ProfileStore {
    store: Arc<dyn DocumentStore>,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Write the whole profile. Callers validate through
    /// [`ProfileForm::validate`](musicschool_shared::validation::ProfileForm::validate).
    pub async fn save(&self, user_id: &UserId, profile: &UserProfile) -> Result<()> {
        let fields = serde_json::to_value(profile).map_err(musicschool_backend::BackendError::from)?;
        self.store
            .set(COLLECTION_USER_PROFILES, user_id.as_str(), fields)
            .await
            .map_err(|e| {
                warn!(user = %user_id.short(), error = %e, "Failed to save profile");
                e
            })?;
        info!(user = %user_id.short(), "profile saved");
        Ok(())
    }

    /// `Ok(None)` when the user has never saved a profile.
    pub async fn load(&self, user_id: &UserId) -> Result<Option<UserProfile>> {
        let profile =
            get_typed::<UserProfile>(self.store.as_ref(), COLLECTION_USER_PROFILES, user_id.as_str())
                .await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use musicschool_backend::MemoryDocumentStore;
    use musicschool_shared::validation::ProfileForm;

    fn form(age: &str) -> ProfileForm {
        ProfileForm {
            full_name: "Ana Souza".into(),
            phone_number: "+55 11 99999-0000".into(),
            instrument: "Violin".into(),
            age: age.into(),
            address: "Rua A, 1".into(),
        }
    }

    #[tokio::test]
    async fn save_overwrites_and_load_reads_back() {
        let store = ProfileStore::new(Arc::new(MemoryDocumentStore::new()));
        let ana = UserId::new("ana");
        assert_eq!(store.load(&ana).await.unwrap(), None);

        let first = form("14").validate().unwrap();
        store.save(&ana, &first).await.unwrap();

        let mut edited = first.clone();
        edited.instrument = "Viola".into();
        store.save(&ana, &edited).await.unwrap();

        assert_eq!(store.load(&ana).await.unwrap(), Some(edited));
    }

    #[tokio::test]
    async fn invalid_forms_never_reach_the_store() {
        let remote = Arc::new(MemoryDocumentStore::new());
        remote.set_offline(true);
        for age in ["11", "18", "abc"] {
            assert!(form(age).validate().is_err());
        }
        let mut blank = form("15");
        blank.address = "   ".into();
        assert!(blank.validate().is_err());
        assert_eq!(remote.reads(), 0);
    }

    #[tokio::test]
    async fn load_failure_is_an_error() {
        let remote = Arc::new(MemoryDocumentStore::new());
        remote.set_offline(true);
        let store = ProfileStore::new(remote);
        assert!(store.load(&UserId::new("ana")).await.is_err());
    }
}
