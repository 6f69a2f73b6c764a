use musicschool_shared::models::AuthUser;
use tracing::{info, warn};

use super::error_message;
use crate::state::AppState;

/// Create an account, sign it in and load its dashboard.
///
/// A session running for the account signed in before is saved to it first.
pub async fn sign_up(state: &AppState, email: &str, password: &str) -> Result<AuthUser, String> {
    let previous = finish_session(state).await;
    let user = state
        .auth
        .sign_up(email, password)
        .await
        .map_err(error_message)?;
    switch_user(state, previous, &user).await;
    Ok(user)
}

/// Sign in and load the dashboard, saving a session of the previous
/// account first.
pub async fn sign_in(state: &AppState, email: &str, password: &str) -> Result<AuthUser, String> {
    let previous = finish_session(state).await;
    let user = state
        .auth
        .sign_in(email, password)
        .await
        .map_err(error_message)?;
    switch_user(state, previous, &user).await;
    Ok(user)
}

/// Sign out, ending any running session first.
pub async fn sign_out(state: &AppState) -> Result<(), String> {
    finish_session(state).await;
    state.auth.sign_out().await.map_err(error_message)?;
    clear_user(state);
    Ok(())
}

pub fn who_am_i(state: &AppState) -> Option<AuthUser> {
    state.auth.current_user()
}

/// Save a running session under the signed-in account and return it.
async fn finish_session(state: &AppState) -> Option<AuthUser> {
    let user = state.auth.current_user()?;
    if let Err(e) = state.dashboard.stop_session(&user.uid).await {
        warn!(error = %e, "Failed to save session of the signed-out account");
    }
    Some(user)
}

fn clear_user(state: &AppState) {
    state.dashboard.reset();
    state.groups.select_group(None);
}

async fn switch_user(state: &AppState, previous: Option<AuthUser>, user: &AuthUser) {
    if previous.is_some_and(|p| p.uid != user.uid) {
        clear_user(state);
    }
    info!(uid = %user.uid.short(), "loading user data");
    state.dashboard.refresh(&user.uid).await;
    state.groups.refresh_groups().await;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::SystemClock;
    use crate::config::ClientConfig;
    use crate::state::Backend;

    fn state() -> AppState {
        AppState::new(ClientConfig::default(), Backend::memory(), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn sign_up_twice_reports_collision() {
        let state = state();
        sign_up(&state, "ana@school.org", "secret1").await.unwrap();
        sign_out(&state).await.unwrap();
        assert!(who_am_i(&state).is_none());

        let err = sign_up(&state, "ana@school.org", "secret1").await.unwrap_err();
        assert_eq!(err, "This email is already registered.");

        let err = sign_in(&state, "ana@school.org", "").await.unwrap_err();
        assert_eq!(err, "Fill in the email and the password");

        let user = sign_in(&state, "ana@school.org", "secret1").await.unwrap();
        assert_eq!(who_am_i(&state), Some(user));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_account_saves_session_to_previous_user() {
        let state = state();
        let ana = sign_up(&state, "ana@school.org", "secret1").await.unwrap();
        let today = state.clock.today();
        state
            .dashboard
            .study_logs()
            .upsert(&ana.uid, today, 3_600_000)
            .await
            .unwrap();

        state.dashboard.start_session();
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;

        let bia = sign_up(&state, "bia@school.org", "secret1").await.unwrap();
        assert!(!state.dashboard.timer().is_running());
        assert_eq!(state.dashboard.study_logs().today_total().get(), 0);
        assert!(state.dashboard.study_logs().history().get().is_empty());
        assert!(state.dashboard.stop_session(&bia.uid).await.unwrap().is_none());

        sign_in(&state, "ana@school.org", "secret1").await.unwrap();
        let total = state.dashboard.study_logs().today_total().get();
        assert!((3_660_000..3_661_000).contains(&total), "total = {total}");
    }
}
