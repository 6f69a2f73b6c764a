//! Domain models shared by the stores, the client services and the shell.
//!
//! Every struct derives `Serialize` and `Deserialize` with camelCase field
//! names, which is also the field naming used inside document-store
//! documents.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DATE_FORMAT;
use crate::types::{GroupId, MessageId, UserId};

// ---------------------------------------------------------------------------
// StudyLog
// ---------------------------------------------------------------------------

/// Total practice time of one user on one calendar day.
///
/// At most one log exists per `(user_id, date)`; its document id is
/// [`StudyLog::document_id`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudyLog {
    /// Calendar day, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Accumulated practice time for the day.
    pub total_time_millis: u64,
    /// Owner of the log.
    pub user_id: UserId,
    /// Commit instant assigned by the document store, absent until written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl StudyLog {
    pub fn new(user_id: UserId, date: NaiveDate, total_time_millis: u64) -> Self {
        Self {
            date,
            total_time_millis,
            user_id,
            timestamp: None,
        }
    }

    /// Unique document key for a (user, day) pair.
    pub fn document_id(user_id: &UserId, date: NaiveDate) -> String {
        format!("{}_{}", user_id, format_date(date))
    }
}

/// Format a calendar day the way documents and cache keys store it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// Personal details of a student. One per user id, always written whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub full_name: String,
    pub phone_number: String,
    pub instrument: String,
    pub age: u8,
    pub address: String,
}

// ---------------------------------------------------------------------------
// StudyGroup
// ---------------------------------------------------------------------------

/// A chat group students can join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudyGroup {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub members: BTreeSet<UserId>,
}

impl StudyGroup {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: GroupId::new(id),
            name: name.to_string(),
            description: description.to_string(),
            members: BTreeSet::new(),
        }
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.contains(user_id)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message inside a study group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    /// Display name resolved from the sender's profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub content: String,
    /// Commit instant assigned by the document store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    /// `true` when the display name still has to be looked up.
    pub fn needs_sender_name(&self) -> bool {
        self.sender_name.as_deref().map_or(true, str::is_empty)
    }
}

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

/// A published link to a recorded performance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub id: Uuid,
    pub user_id: UserId,
    /// Email of the publisher at the time of publishing.
    pub username: String,
    pub title: String,
    pub video_link: String,
    pub published_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AuthUser
// ---------------------------------------------------------------------------

/// The signed-in identity as reported by the authentication provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: UserId,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_log_uses_camel_case_and_iso_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let log = StudyLog::new(UserId::new("u1"), date, 1_500);
        let value = serde_json::to_value(&log).unwrap();

        assert_eq!(value["date"], "2026-10-18");
        assert_eq!(value["totalTimeMillis"], 1_500);
        assert_eq!(value["userId"], "u1");
        assert!(value.get("timestamp").is_none());
        assert_eq!(StudyLog::document_id(&log.user_id, date), "u1_2026-10-18");
    }

    #[test]
    fn message_without_name_needs_lookup() {
        let mut msg = Message {
            id: MessageId::new(),
            sender_id: UserId::new("u1"),
            sender_name: None,
            content: "hi".into(),
            timestamp: None,
        };
        assert!(msg.needs_sender_name());

        msg.sender_name = Some(String::new());
        assert!(msg.needs_sender_name());

        msg.sender_name = Some("Ana".into());
        assert!(!msg.needs_sender_name());
    }
}
