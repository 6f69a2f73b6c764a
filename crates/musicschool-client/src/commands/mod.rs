//! User-facing command handlers.
//!
//! Each sub-module groups related commands by domain. Handlers take the
//! shared [`AppState`](crate::state::AppState) and return
//! `Result<T, String>` where the error is the text to show the student.

pub mod auth;
pub mod groups;
pub mod performances;
pub mod profile;
pub mod study;

use musicschool_shared::models::AuthUser;

use crate::error::ClientError;
use crate::state::AppState;

/// Render an error for the student. Auth failures use their fixed wording.
pub fn error_message(error: ClientError) -> String {
    match error {
        ClientError::Auth(e) => crate::auth::user_message(&e),
        other => other.to_string(),
    }
}

fn signed_in(state: &AppState) -> Result<AuthUser, String> {
    state
        .auth
        .require_user()
        .map_err(|_| "Sign in first".to_string())
}
