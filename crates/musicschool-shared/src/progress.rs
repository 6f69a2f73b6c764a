//! Formatting and gamification of the daily practice total.

use crate::constants::{
    DEDICATED_POINTS, DEDICATED_THRESHOLD_MINUTES, MASTER_POINTS, MASTER_THRESHOLD_MINUTES,
};

/// Render milliseconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_time(millis: u64) -> String {
    let total_secs = millis / 1_000;
    let hours = total_secs / 3_600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Reward tier for the time studied today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Achievement {
    NotStarted,
    KeepGoing,
    DedicatedStudent,
    MusicMaster,
}

impl Achievement {
    pub fn for_total(millis: u64) -> Self {
        let minutes = millis / 60_000;
        if minutes >= MASTER_THRESHOLD_MINUTES {
            Self::MusicMaster
        } else if minutes >= DEDICATED_THRESHOLD_MINUTES {
            Self::DedicatedStudent
        } else if minutes > 0 {
            Self::KeepGoing
        } else {
            Self::NotStarted
        }
    }

    pub fn points(self) -> u32 {
        match self {
            Self::MusicMaster => MASTER_POINTS,
            Self::DedicatedStudent => DEDICATED_POINTS,
            Self::KeepGoing | Self::NotStarted => 0,
        }
    }

    pub fn badge(self) -> Option<&'static str> {
        match self {
            Self::MusicMaster => Some("Music Master"),
            Self::DedicatedStudent => Some("Dedicated Student"),
            Self::KeepGoing | Self::NotStarted => None,
        }
    }

    /// Sentence shown under the daily total.
    pub fn message(self, millis: u64) -> String {
        let studied = format_time(millis);
        match (self, self.badge()) {
            (Self::NotStarted, _) => "You haven't studied today yet. How about starting now?".into(),
            (Self::KeepGoing, _) => format!("You studied {studied}! Keep it up!"),
            (_, Some(badge)) => format!(
                "You studied {studied}! You earned {} points and the '{badge}' badge!",
                self.points()
            ),
            (_, None) => format!("You studied {studied}!"),
        }
    }
}
