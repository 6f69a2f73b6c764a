use musicschool_shared::models::Performance;

use super::{error_message, signed_in};
use crate::state::AppState;

pub async fn publish_performance(
    state: &AppState,
    title: &str,
    video_link: &str,
) -> Result<Performance, String> {
    let user = signed_in(state)?;
    state
        .performances
        .publish(&user, title, video_link)
        .await
        .map_err(error_message)
}

pub async fn list_performances(state: &AppState) -> Vec<Performance> {
    state.performances.list().await
}
