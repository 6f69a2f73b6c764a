//! Dashboard orchestration: profile name, today's total, the running
//! session and the recent history.

use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate};
use musicschool_shared::constants::DEFAULT_STUDENT_NAME;
use musicschool_shared::models::StudyLog;
use musicschool_shared::progress::Achievement;
use musicschool_shared::types::UserId;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::profile::ProfileStore;
use crate::study_log::StudyLogStore;
use crate::subscription::Observable;
use crate::timer::SessionTimer;

/// First day of a `days`-long history window ending on `today`.
///
/// Windows reaching past the calendar start at [`NaiveDate::MIN`].
pub fn history_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Day and baseline of the running session.
#[derive(Debug, Clone, Copy)]
struct SessionStart {
    day: NaiveDate,
    baseline: u64,
}

/// What the dashboard shows after a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub full_name: String,
    pub today_total: u64,
    pub achievement: Achievement,
    pub history: Vec<StudyLog>,
}

pub struct Dashboard {
    timer: SessionTimer,
    study_logs: StudyLogStore,
    profiles: ProfileStore,
    clock: Arc<dyn Clock>,
    history_days: u32,
    full_name: Observable<String>,
    session: Mutex<Option<SessionStart>>,
}

impl Dashboard {
    pub fn new(
        timer: SessionTimer,
        study_logs: StudyLogStore,
        profiles: ProfileStore,
        clock: Arc<dyn Clock>,
        history_days: u32,
    ) -> Self {
        Self {
            timer,
            study_logs,
            profiles,
            clock,
            history_days,
            full_name: Observable::new(DEFAULT_STUDENT_NAME.to_string()),
            session: Mutex::new(None),
        }
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn study_logs(&self) -> &StudyLogStore {
        &self.study_logs
    }

    pub fn full_name(&self) -> &Observable<String> {
        &self.full_name
    }

    /// Reload everything for `user_id`: cached values first, then the store.
    pub async fn refresh(&self, user_id: &UserId) -> DashboardSummary {
        let today = self.clock.today();
        self.study_logs.load_cached(user_id, today);

        let name = match self.profiles.load(user_id).await {
            Ok(Some(profile)) => profile.full_name,
            Ok(None) => DEFAULT_STUDENT_NAME.to_string(),
            Err(e) => {
                warn!(error = %e, "Failed to load profile for dashboard");
                self.full_name.get()
            }
        };
        self.full_name.publish(name);

        self.study_logs.load_today(user_id, today).await;
        let since = history_start(today, self.history_days);
        self.study_logs.query_recent(user_id, since).await;

        self.summary()
    }

    pub fn summary(&self) -> DashboardSummary {
        let today_total = self.study_logs.today_total().get();
        DashboardSummary {
            full_name: self.full_name.get(),
            today_total,
            achievement: Achievement::for_total(today_total),
            history: self.study_logs.history().get(),
        }
    }

    pub fn achievement(&self) -> Achievement {
        Achievement::for_total(self.study_logs.today_total().get())
    }

    /// Start timing on top of today's total. `false` if already running.
    pub fn start_session(&self) -> bool {
        let baseline = self.study_logs.today_total().get();
        if !self.timer.start(baseline) {
            return false;
        }
        *self.session_start() = Some(SessionStart {
            day: self.clock.today(),
            baseline,
        });
        true
    }

    /// Stop timing and persist the new daily total.
    ///
    /// The session is credited to the day on which it stops. When that is
    /// not the day it started, only the session time is added on top of the
    /// new day's total.
    ///
    /// `Ok(None)` when no session was running. A failed remote write is
    /// returned as an error; the total is still kept locally.
    pub async fn stop_session(&self, user_id: &UserId) -> Result<Option<u64>> {
        let Some(mut total) = self.timer.stop() else {
            return Ok(None);
        };
        let started = self.session_start().take();
        let today = self.clock.today();

        if let Some(start) = started.filter(|s| s.day != today) {
            let elapsed = total.saturating_sub(start.baseline);
            let baseline = self.study_logs.load_today(user_id, today).await;
            total = baseline.saturating_add(elapsed);
            info!(from = %start.day, to = %today, elapsed, "session crossed midnight");
        }

        info!(total, "session finished");
        self.study_logs.upsert(user_id, today, total).await?;
        Ok(Some(total))
    }

    fn session_start(&self) -> std::sync::MutexGuard<'_, Option<SessionStart>> {
        self.session.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Drop per-user state, e.g. on sign-out.
    pub fn reset(&self) {
        self.timer.stop();
        self.session_start().take();
        self.study_logs.clear();
        self.full_name.publish(DEFAULT_STUDENT_NAME.to_string());
    }
}
