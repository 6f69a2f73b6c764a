//! Study groups and their chat messages.
//!
//! The group list is a fixed seed set whose memberships are stored in the
//! `study_groups` collection. Messages of the selected group are published
//! through [`GroupStore::messages`].

use std::sync::Arc;

use futures::future::join_all;
use musicschool_backend::document::{encode_with_server_timestamp, get_typed, query_typed};
use musicschool_backend::{Direction, DocumentStore, Query};
use musicschool_shared::constants::COLLECTION_STUDY_GROUPS;
use musicschool_shared::models::{Message, StudyGroup};
use musicschool_shared::types::{GroupId, MessageId, UserId};
use musicschool_shared::validation::validate_message;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::names::NameResolver;
use crate::subscription::Observable;

/// The groups every installation starts with.
pub fn seed_groups() -> Vec<StudyGroup> {
    vec![
        StudyGroup::new(
            "group1",
            "Acoustic Guitar",
            "For everyone who loves the guitar and bossa nova.",
        ),
        StudyGroup::new("group2", "Advanced Music Theory", "For the future maestros!"),
    ]
}

pub struct GroupStore {
    store: Arc<dyn DocumentStore>,
    names: NameResolver,
    groups: Observable<Vec<StudyGroup>>,
    selected: Observable<Option<GroupId>>,
    messages: Observable<Vec<Message>>,
}

impl GroupStore {
    pub fn new(store: Arc<dyn DocumentStore>, names: NameResolver) -> Self {
        Self {
            store,
            names,
            groups: Observable::new(seed_groups()),
            selected: Observable::new(None),
            messages: Observable::new(Vec::new()),
        }
    }

    pub fn groups(&self) -> Vec<StudyGroup> {
        self.groups.get()
    }

    pub fn selected(&self) -> &Observable<Option<GroupId>> {
        &self.selected
    }

    /// Messages of the selected group, oldest first.
    pub fn messages(&self) -> &Observable<Vec<Message>> {
        &self.messages
    }

    fn find(&self, group_id: &GroupId) -> Option<StudyGroup> {
        self.groups.get().into_iter().find(|g| &g.id == group_id)
    }

    fn is_selected(&self, group_id: &GroupId) -> bool {
        self.selected.get().as_ref() == Some(group_id)
    }

    /// Pull stored memberships for the seed groups.
    pub async fn refresh_groups(&self) {
        for group in seed_groups() {
            let stored = get_typed::<StudyGroup>(
                self.store.as_ref(),
                COLLECTION_STUDY_GROUPS,
                group.id.as_str(),
            )
            .await;
            match stored {
                Ok(Some(stored)) => self.groups.update(|groups| {
                    if let Some(g) = groups.iter_mut().find(|g| g.id == group.id) {
                        g.members.extend(stored.members);
                    }
                }),
                Ok(None) => {}
                Err(e) => warn!(group = %group.id, error = %e, "Failed to load group members"),
            }
        }
    }

    pub fn is_member(&self, group_id: &GroupId, user_id: &UserId) -> bool {
        self.find(group_id)
            .map(|g| g.is_member(user_id))
            .unwrap_or(false)
    }

    /// Change the selection. The message list is cleared when the selection
    /// changes; call [`GroupStore::load_messages`] to fill it.
    pub fn select_group(&self, group_id: Option<GroupId>) {
        if self.selected.get() != group_id {
            self.selected.publish(group_id);
            self.messages.publish(Vec::new());
        }
    }

    /// Add `user_id` to the group (no-op if already a member) and select it.
    pub async fn join_group(&self, group_id: &GroupId, user_id: &UserId) -> Result<StudyGroup> {
        let mut group = self
            .find(group_id)
            .ok_or_else(|| ClientError::UnknownGroup(group_id.to_string()))?;

        if group.members.insert(user_id.clone()) {
            let updated = group.clone();
            self.groups.update(|groups| {
                if let Some(g) = groups.iter_mut().find(|g| g.id == updated.id) {
                    *g = updated;
                }
            });
            info!(group = %group_id, user = %user_id.short(), "joined group");

            match serde_json::to_value(&group) {
                Ok(fields) => {
                    if let Err(e) = self
                        .store
                        .set(COLLECTION_STUDY_GROUPS, group_id.as_str(), fields)
                        .await
                    {
                        warn!(group = %group_id, error = %e, "Failed to store group membership");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to encode group"),
            }
        }

        self.select_group(Some(group_id.clone()));
        Ok(group)
    }

    /// Send a message to a group.
    ///
    /// The message is shown at once if the group is selected and removed
    /// again if the write fails.
    pub async fn post_message(
        &self,
        group_id: &GroupId,
        sender_id: &UserId,
        content: &str,
    ) -> Result<Message> {
        let content = validate_message(content)?;
        let sender_name = self.names.resolve(sender_id).await;

        let message = Message {
            id: MessageId::new(),
            sender_id: sender_id.clone(),
            sender_name: Some(sender_name),
            content,
            timestamp: None,
        };

        let optimistic = self.is_selected(group_id);
        if optimistic {
            let pending = message.clone();
            self.messages.update(|list| list.push(pending));
        }

        let collection = group_id.messages_collection();
        let written = match encode_with_server_timestamp(&message, "timestamp") {
            Ok(fields) => self
                .store
                .set(&collection, &message.id.to_string(), fields)
                .await
                .and_then(|doc| doc.decode::<Message>()),
            Err(e) => Err(e),
        };

        match written {
            Ok(stored) => {
                if optimistic {
                    let confirmed = stored.clone();
                    self.messages.update(|list| {
                        if let Some(m) = list.iter_mut().find(|m| m.id == confirmed.id) {
                            *m = confirmed;
                        }
                    });
                }
                debug!(group = %group_id, id = %stored.id, "message posted");
                Ok(stored)
            }
            Err(e) => {
                warn!(group = %group_id, error = %e, "Failed to post message");
                if optimistic {
                    self.messages.update(|list| list.retain(|m| m.id != message.id));
                }
                Err(e.into())
            }
        }
    }

    /// Fetch the group's messages and fill in missing sender names.
    ///
    /// All name lookups run concurrently and the list is published once they
    /// have all finished. Nothing is published if the selection moved to
    /// another group in the meantime. A failed fetch publishes an empty list.
    pub async fn load_messages(&self, group_id: &GroupId) -> Vec<Message> {
        let query = Query::collection(group_id.messages_collection())
            .order_by("timestamp", Direction::Ascending);

        let loaded = match query_typed::<Message>(self.store.as_ref(), &query).await {
            Ok(messages) => {
                join_all(messages.into_iter().map(|message| async move {
                    if message.needs_sender_name() {
                        let name = self.names.resolve(&message.sender_id).await;
                        Message {
                            sender_name: Some(name),
                            ..message
                        }
                    } else {
                        message
                    }
                }))
                .await
            }
            Err(e) => {
                warn!(group = %group_id, error = %e, "Failed to load messages");
                Vec::new()
            }
        };

        if !self.is_selected(group_id) {
            debug!(group = %group_id, "selection changed, discarding loaded messages");
            return loaded;
        }
        debug!(group = %group_id, count = loaded.len(), "messages loaded");
        self.messages.publish(loaded.clone());
        loaded
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::profile::ProfileStore;
    use musicschool_backend::document::server_timestamp;
    use musicschool_backend::MemoryDocumentStore;
    use musicschool_shared::constants::UNKNOWN_SENDER_NAME;
    use musicschool_shared::models::UserProfile;
    use musicschool_store::MemoryCache;
    use serde_json::json;
    use uuid::Uuid;

    fn fixture() -> (Arc<MemoryDocumentStore>, ProfileStore, GroupStore) {
        let remote = Arc::new(MemoryDocumentStore::new());
        let profiles = ProfileStore::new(remote.clone());
        let names = NameResolver::new(Arc::new(MemoryCache::new()), profiles.clone());
        let groups = GroupStore::new(remote.clone(), names);
        (remote, profiles, groups)
    }

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            full_name: name.into(),
            phone_number: "1".into(),
            instrument: "Flute".into(),
            age: 13,
            address: "x".into(),
        }
    }

    async fn raw_message(remote: &MemoryDocumentStore, group: &GroupId, sender: &str, text: &str) {
        let id = Uuid::new_v4().to_string();
        remote
            .set(
                &group.messages_collection(),
                &id,
                json!({"id": id, "senderId": sender, "content": text, "timestamp": server_timestamp()}),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn join_is_idempotent_and_selects() {
        let (_, _, groups) = fixture();
        let g1 = GroupId::new("group1");
        let ana = UserId::new("ana");

        groups.join_group(&g1, &ana).await.unwrap();
        let group = groups.join_group(&g1, &ana).await.unwrap();
        assert_eq!(group.members.len(), 1);
        assert!(groups.is_member(&g1, &ana));
        assert!(!groups.is_member(&GroupId::new("group2"), &ana));
        assert_eq!(groups.selected().get(), Some(g1));

        assert!(matches!(
            groups.join_group(&GroupId::new("nope"), &ana).await,
            Err(ClientError::UnknownGroup(_))
        ));
    }

    #[tokio::test]
    async fn membership_is_restored_from_the_store() {
        let (remote, profiles, groups) = fixture();
        let g2 = GroupId::new("group2");
        let ana = UserId::new("ana");
        groups.join_group(&g2, &ana).await.unwrap();

        let names = NameResolver::new(Arc::new(MemoryCache::new()), profiles);
        let fresh = GroupStore::new(remote, names);
        assert!(!fresh.is_member(&g2, &ana));
        fresh.refresh_groups().await;
        assert!(fresh.is_member(&g2, &ana));
    }

    #[tokio::test]
    async fn post_appends_only_to_selected_group() {
        let (_, profiles, groups) = fixture();
        let g1 = GroupId::new("group1");
        let g2 = GroupId::new("group2");
        let ana = UserId::new("ana");
        profiles.save(&ana, &profile("Ana")).await.unwrap();

        groups.select_group(Some(g1.clone()));
        let posted = groups.post_message(&g1, &ana, "  hello ").await.unwrap();
        assert_eq!(posted.content, "hello");
        assert_eq!(posted.sender_name.as_deref(), Some("Ana"));
        assert!(posted.timestamp.is_some());
        assert_eq!(groups.messages().get(), vec![posted]);

        groups.post_message(&g2, &ana, "elsewhere").await.unwrap();
        assert_eq!(groups.messages().get().len(), 1);

        assert!(matches!(
            groups.post_message(&g1, &ana, "   ").await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn failed_post_rolls_back() {
        let (remote, _, groups) = fixture();
        let g1 = GroupId::new("group1");
        groups.select_group(Some(g1.clone()));
        remote.set_offline(true);

        assert!(groups
            .post_message(&g1, &UserId::new("ana"), "hi")
            .await
            .is_err());
        assert!(groups.messages().get().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn names_resolve_concurrently_and_publish_once() {
        let (remote, profiles, groups) = fixture();
        let g1 = GroupId::new("group1");
        for (uid, name) in [("u1", "Ana"), ("u2", "Bia"), ("u3", "Caio")] {
            profiles.save(&UserId::new(uid), &profile(name)).await.unwrap();
            raw_message(&remote, &g1, uid, "hi").await;
        }
        raw_message(&remote, &g1, "ghost", "boo").await;

        groups.select_group(Some(g1.clone()));
        let mut sub = groups.messages().subscribe();
        remote.set_read_latency(Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        let loaded = groups.load_messages(&g1).await;
        // One query plus one round of parallel profile lookups.
        assert!(started.elapsed() < Duration::from_millis(300));

        let names: Vec<_> = loaded
            .iter()
            .map(|m| m.sender_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["Ana", "Bia", "Caio", UNKNOWN_SENDER_NAME]);

        assert_eq!(sub.changed().await.unwrap(), loaded);
        let again = tokio::time::timeout(Duration::from_secs(1), sub.changed()).await;
        assert!(again.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_load_is_discarded() {
        let (remote, _, groups) = fixture();
        let g1 = GroupId::new("group1");
        let g2 = GroupId::new("group2");
        raw_message(&remote, &g1, "u1", "hi").await;
        remote.set_read_latency(Duration::from_millis(100));

        groups.select_group(Some(g1.clone()));
        let (loaded, _) = tokio::join!(groups.load_messages(&g1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            groups.select_group(Some(g2.clone()));
        });

        assert_eq!(loaded.len(), 1);
        assert!(groups.messages().get().is_empty());
        assert_eq!(groups.selected().get(), Some(g2));
    }

    #[tokio::test]
    async fn failed_load_publishes_empty_list() {
        let (remote, _, groups) = fixture();
        let g1 = GroupId::new("group1");
        groups.select_group(Some(g1.clone()));
        groups.post_message(&g1, &UserId::new("ana"), "hi").await.unwrap();
        assert_eq!(groups.messages().get().len(), 1);

        remote.set_offline(true);
        assert!(groups.load_messages(&g1).await.is_empty());
        assert!(groups.messages().get().is_empty());
    }
}
