use musicschool_shared::models::UserProfile;
use musicschool_shared::validation::ProfileForm;
use tracing::info;

use super::{error_message, signed_in};
use crate::state::AppState;

pub async fn get_profile(state: &AppState) -> Result<Option<UserProfile>, String> {
    let user = signed_in(state)?;
    state
        .profiles
        .load(&user.uid)
        .await
        .map_err(|e| format!("Failed to load profile: {e}"))
}

/// Validate and store the whole profile.
pub async fn save_profile(state: &AppState, form: &ProfileForm) -> Result<UserProfile, String> {
    let user = signed_in(state)?;
    let profile = form.validate().map_err(|e| e.to_string())?;

    state
        .profiles
        .save(&user.uid, &profile)
        .await
        .map_err(error_message)?;

    state.names.forget(&user.uid);
    state.dashboard.full_name().publish(profile.full_name.clone());
    info!(uid = %user.uid.short(), "profile updated");
    Ok(profile)
}
