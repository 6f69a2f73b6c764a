//! Authentication provider trait and the password handling shared by the
//! reference providers.

use async_trait::async_trait;
use musicschool_shared::constants::MIN_PASSWORD_LEN;
use musicschool_shared::models::AuthUser;
use musicschool_shared::types::UserId;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Key derivation context for password hashes (BLAKE3).
const KDF_CONTEXT_PASSWORD: &str = "musicschool-password-v1";

/// Error taxonomy of an email/password authentication service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("An account already exists for this email")]
    UserCollision,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication backend error: {0}")]
    Backend(String),
}

/// Email + password authentication service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The signed-in identity, if any.
    async fn current_user(&self) -> Option<AuthUser>;
}

/// A stored account: identity plus salted password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRecord {
    pub uid: UserId,
    /// Lower-cased, trimmed email.
    pub email: String,
    /// Hex-encoded 16-byte salt.
    pub salt_hex: String,
    /// Hex-encoded BLAKE3 derived key.
    pub password_hash: String,
}

impl AccountRecord {
    /// Build a new account after checking the email shape and password policy.
    pub fn create(email: &str, password: &str) -> Result<Self, AuthError> {
        let email = normalize_email(email)?;
        check_password_policy(password)?;

        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);

        Ok(Self {
            uid: UserId::new(Uuid::new_v4().simple().to_string()),
            email,
            salt_hex: hex::encode(salt),
            password_hash: hash_password(&salt, password),
        })
    }

    pub fn verify(&self, password: &str) -> bool {
        match hex::decode(&self.salt_hex) {
            Ok(salt) => hash_password(&salt, password) == self.password_hash,
            Err(_) => false,
        }
    }

    pub fn to_user(&self) -> AuthUser {
        AuthUser {
            uid: self.uid.clone(),
            email: self.email.clone(),
        }
    }
}

/// Derive a password hash from a salt using BLAKE3 in key-derivation mode.
pub fn hash_password(salt: &[u8], password: &str) -> String {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_PASSWORD);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize().as_bytes())
}

pub fn check_password_policy(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

/// Trim and lower-case an email; malformed addresses are reported as
/// invalid credentials.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(AuthError::InvalidCredentials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_verifies_its_own_password() {
        let account = AccountRecord::create("Ana@School.org ", "secret1").unwrap();
        assert_eq!(account.email, "ana@school.org");
        assert!(account.verify("secret1"));
        assert!(!account.verify("secret2"));
    }

    #[test]
    fn salts_differ_between_accounts() {
        let a = AccountRecord::create("a@x.io", "secret1").unwrap();
        let b = AccountRecord::create("b@x.io", "secret1").unwrap();
        assert_ne!(a.password_hash, b.password_hash);
        assert_ne!(a.uid, b.uid);
    }

    #[test]
    fn policy_and_email_shape() {
        assert_eq!(
            AccountRecord::create("a@x.io", "12345").unwrap_err(),
            AuthError::WeakPassword
        );
        assert_eq!(normalize_email("nobody").unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(normalize_email("a@localhost").unwrap_err(), AuthError::InvalidCredentials);
    }
}
