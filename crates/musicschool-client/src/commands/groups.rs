use musicschool_shared::models::{Message, StudyGroup};
use musicschool_shared::types::GroupId;
use serde::Serialize;

use super::{error_message, signed_in};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub group: StudyGroup,
    pub is_member: bool,
    pub selected: bool,
}

pub fn list_groups(state: &AppState) -> Vec<GroupView> {
    let user = state.auth.current_user();
    let selected = state.groups.selected().get();
    state
        .groups
        .groups()
        .into_iter()
        .map(|group| GroupView {
            is_member: user
                .as_ref()
                .map(|u| group.is_member(&u.uid))
                .unwrap_or(false),
            selected: selected.as_ref() == Some(&group.id),
            group,
        })
        .collect()
}

/// Join a group, select it and load its messages.
pub async fn join_group(state: &AppState, group_id: &str) -> Result<Vec<Message>, String> {
    let user = signed_in(state)?;
    let group_id = GroupId::new(group_id);
    state
        .groups
        .join_group(&group_id, &user.uid)
        .await
        .map_err(error_message)?;
    Ok(state.groups.load_messages(&group_id).await)
}

/// Select a group the user belongs to and load its messages.
pub async fn open_group(state: &AppState, group_id: &str) -> Result<Vec<Message>, String> {
    let user = signed_in(state)?;
    let group_id = GroupId::new(group_id);
    if !state.groups.groups().iter().any(|g| g.id == group_id) {
        return Err(format!("Unknown study group: {group_id}"));
    }
    if !state.groups.is_member(&group_id, &user.uid) {
        return Err(format!("Join {group_id} first"));
    }
    state.groups.select_group(Some(group_id.clone()));
    Ok(state.groups.load_messages(&group_id).await)
}

/// Post to the selected group.
pub async fn post_message(state: &AppState, content: &str) -> Result<Message, String> {
    let user = signed_in(state)?;
    let group_id = state
        .groups
        .selected()
        .get()
        .ok_or_else(|| "Open a group first".to_string())?;
    state
        .groups
        .post_message(&group_id, &user.uid, content)
        .await
        .map_err(error_message)
}

/// Reload the selected group's messages.
pub async fn get_messages(state: &AppState) -> Result<Vec<Message>, String> {
    signed_in(state)?;
    let group_id = state
        .groups
        .selected()
        .get()
        .ok_or_else(|| "Open a group first".to_string())?;
    Ok(state.groups.load_messages(&group_id).await)
}
