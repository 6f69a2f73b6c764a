/// Application name
pub const APP_NAME: &str = "EMA Music School";

/// Collection holding one profile document per user id
pub const COLLECTION_USER_PROFILES: &str = "user_profiles";

/// Collection holding one study log per (user, day)
pub const COLLECTION_STUDY_LOGS: &str = "study_logs";

/// Parent collection of the per-group `messages` sub-collection
pub const COLLECTION_STUDY_GROUPS: &str = "study_groups";

/// Collection holding published performance links
pub const COLLECTION_PERFORMANCES: &str = "performances";

/// Youngest accepted student age
pub const MIN_STUDENT_AGE: u8 = 12;

/// Oldest accepted student age
pub const MAX_STUDENT_AGE: u8 = 17;

/// Minimum password length accepted on sign-up
pub const MIN_PASSWORD_LEN: usize = 6;

/// Session timer refresh period in milliseconds
pub const DEFAULT_TICK_MILLIS: u64 = 1_000;

/// Days of history shown on the dashboard
pub const DEFAULT_HISTORY_DAYS: u32 = 7;

/// Largest configurable history window, about ten years.
pub const MAX_HISTORY_DAYS: u32 = 3_650;

/// Display name used when a sender profile cannot be resolved
pub const UNKNOWN_SENDER_NAME: &str = "Unknown name";

/// Display name used on the dashboard before a profile exists
pub const DEFAULT_STUDENT_NAME: &str = "Student";

/// Calendar day format used in study log documents and cache keys
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Achievement thresholds (minutes studied today)
pub const MASTER_THRESHOLD_MINUTES: u64 = 60;
pub const DEDICATED_THRESHOLD_MINUTES: u64 = 30;

/// Points awarded per achievement tier
pub const MASTER_POINTS: u32 = 100;
pub const DEDICATED_POINTS: u32 = 50;

/// Path of the message sub-collection for a group.
pub fn group_messages_collection(group_id: &str) -> String {
    format!("{COLLECTION_STUDY_GROUPS}/{group_id}/messages")
}
