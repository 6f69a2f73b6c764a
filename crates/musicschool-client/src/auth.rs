//! Signed-in identity on top of an [`AuthProvider`].

use std::sync::Arc;

use musicschool_backend::{AuthError, AuthProvider};
use musicschool_shared::models::AuthUser;
use musicschool_shared::validation::{validate_sign_in, validate_sign_up};
use tracing::{info, warn};

use crate::error::{ClientError, Result};
use crate::subscription::Observable;

/// Text shown to the student for an authentication failure.
pub fn user_message(error: &AuthError) -> String {
    match error {
        AuthError::UserCollision => "This email is already registered.".to_string(),
        AuthError::WeakPassword => {
            "The password is too weak. Use at least 6 characters.".to_string()
        }
        AuthError::InvalidCredentials => "Invalid email or password.".to_string(),
        AuthError::Backend(detail) => format!("An error occurred: {detail}"),
    }
}

pub struct AuthSession {
    provider: Arc<dyn AuthProvider>,
    user: Observable<Option<AuthUser>>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            user: Observable::new(None),
        }
    }

    /// Pick up a session the provider remembered from a previous run.
    pub async fn restore(&self) -> Option<AuthUser> {
        let user = self.provider.current_user().await;
        if let Some(u) = &user {
            info!(uid = %u.uid.short(), "session restored");
        }
        self.user.publish(user.clone());
        user
    }

    pub fn user(&self) -> &Observable<Option<AuthUser>> {
        &self.user
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.user.get()
    }

    /// The signed-in user or [`ClientError::NotSignedIn`].
    pub fn require_user(&self) -> Result<AuthUser> {
        self.current_user().ok_or(ClientError::NotSignedIn)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let (email, password) = validate_sign_up(email, password)?;
        let user = self
            .provider
            .sign_up(&email, &password)
            .await
            .map_err(|e| {
                warn!(error = %e, "Sign-up failed");
                e
            })?;
        info!(uid = %user.uid.short(), "signed up");
        self.user.publish(Some(user.clone()));
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let (email, password) = validate_sign_in(email, password)?;
        let user = self
            .provider
            .sign_in(&email, &password)
            .await
            .map_err(|e| {
                warn!(error = %e, "Sign-in failed");
                e
            })?;
        info!(uid = %user.uid.short(), "signed in");
        self.user.publish(Some(user.clone()));
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await?;
        self.user.publish(None);
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use musicschool_backend::MemoryAuthProvider;
    use musicschool_shared::error::ValidationError;

    fn session() -> AuthSession {
        AuthSession::new(Arc::new(MemoryAuthProvider::new()))
    }

    fn auth_message(result: Result<AuthUser>) -> String {
        match result {
            Err(ClientError::Auth(e)) => user_message(&e),
            other => panic!("expected an auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sign_up_sign_out_sign_in() {
        let auth = session();
        let user = auth.sign_up("ana@school.org", "secret1").await.unwrap();
        assert_eq!(auth.current_user(), Some(user.clone()));

        auth.sign_out().await.unwrap();
        assert!(matches!(auth.require_user(), Err(ClientError::NotSignedIn)));

        let again = auth.sign_in("ana@school.org", "secret1").await.unwrap();
        assert_eq!(again.uid, user.uid);
    }

    #[tokio::test]
    async fn provider_errors_map_to_messages() {
        let auth = session();
        auth.sign_up("ana@school.org", "secret1").await.unwrap();

        assert_eq!(
            auth_message(auth.sign_up("ana@school.org", "secret1").await),
            "This email is already registered."
        );
        assert_eq!(
            auth_message(auth.sign_in("ana@school.org", "wrong-one").await),
            "Invalid email or password."
        );
        assert_eq!(
            user_message(&AuthError::Backend("offline".into())),
            "An error occurred: offline"
        );
    }

    #[tokio::test]
    async fn caller_validation_runs_first() {
        let provider = Arc::new(MemoryAuthProvider::new());
        provider.set_offline(true);
        let auth = AuthSession::new(provider);

        assert!(matches!(
            auth.sign_in("", "secret1").await,
            Err(ClientError::Validation(ValidationError::MissingCredentials))
        ));
        assert!(matches!(
            auth.sign_up("ana@school.org", "123").await,
            Err(ClientError::Validation(ValidationError::PasswordTooShort(6)))
        ));
    }
}
