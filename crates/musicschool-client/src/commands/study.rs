use musicschool_shared::models::StudyLog;
use musicschool_shared::progress::format_time;
use serde::Serialize;

use super::{error_message, signed_in};
use crate::dashboard::{history_start, DashboardSummary};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub running: bool,
    /// Elapsed time of the running session as of the last tick.
    pub session_millis: u64,
    /// Today's total including the running session.
    pub today_millis: u64,
}

impl SessionStatus {
    pub fn display(&self) -> String {
        if self.running {
            format!(
                "studying {} (today {})",
                format_time(self.session_millis),
                format_time(self.today_millis)
            )
        } else {
            format!("idle (today {})", format_time(self.today_millis))
        }
    }
}

pub fn start_session(state: &AppState) -> Result<(), String> {
    signed_in(state)?;
    if state.dashboard.start_session() {
        Ok(())
    } else {
        Err("A session is already running".into())
    }
}

/// Stop the running session and save the new total for today.
pub async fn stop_session(state: &AppState) -> Result<u64, String> {
    let user = signed_in(state)?;
    match state.dashboard.stop_session(&user.uid).await {
        Ok(Some(total)) => Ok(total),
        Ok(None) => Err("No session is running".into()),
        Err(e) => Err(format!("Saved locally, sync failed: {}", error_message(e))),
    }
}

pub fn session_status(state: &AppState) -> SessionStatus {
    let timer = state.dashboard.timer();
    let today = state.dashboard.study_logs().today_total().get();
    SessionStatus {
        running: timer.is_running(),
        session_millis: timer.displayed_elapsed(),
        today_millis: timer.live_total().unwrap_or(today),
    }
}

pub async fn today(state: &AppState) -> Result<DashboardSummary, String> {
    let user = signed_in(state)?;
    Ok(state.dashboard.refresh(&user.uid).await)
}

/// Logs of the last `days` days (configured window when `None`).
pub async fn history(state: &AppState, days: Option<u32>) -> Result<Vec<StudyLog>, String> {
    let user = signed_in(state)?;
    let days = days.unwrap_or(state.config.history_days);
    let since = history_start(state.clock.today(), days);
    Ok(state
        .dashboard
        .study_logs()
        .query_recent(&user.uid, since)
        .await)
}
