//! Input validation performed by callers before any store call.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_STUDENT_AGE, MIN_PASSWORD_LEN, MIN_STUDENT_AGE};
use crate::error::ValidationError;
use crate::models::UserProfile;

/// Raw profile fields as typed by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub full_name: String,
    pub phone_number: String,
    pub instrument: String,
    pub age: String,
    pub address: String,
}

impl ProfileForm {
    /// Trim every field, require all of them, and check the age range.
    pub fn validate(&self) -> Result<UserProfile, ValidationError> {
        let full_name = required("full name", &self.full_name)?;
        let phone_number = required("phone number", &self.phone_number)?;
        let instrument = required("instrument", &self.instrument)?;
        let age = required("age", &self.age)?;
        let address = required("address", &self.address)?;

        let age: i64 = age.parse().map_err(|_| ValidationError::AgeNotANumber)?;

        Ok(UserProfile {
            full_name,
            phone_number,
            instrument,
            age: validate_age(age)?,
            address,
        })
    }
}

impl From<&UserProfile> for ProfileForm {
    fn from(p: &UserProfile) -> Self {
        Self {
            full_name: p.full_name.clone(),
            phone_number: p.phone_number.clone(),
            instrument: p.instrument.clone(),
            age: p.age.to_string(),
            address: p.address.clone(),
        }
    }
}

/// Accept ages in `[MIN_STUDENT_AGE, MAX_STUDENT_AGE]`.
pub fn validate_age(age: i64) -> Result<u8, ValidationError> {
    if age < i64::from(MIN_STUDENT_AGE) || age > i64::from(MAX_STUDENT_AGE) {
        return Err(ValidationError::AgeOutOfRange {
            age,
            min: MIN_STUDENT_AGE,
            max: MAX_STUDENT_AGE,
        });
    }
    Ok(age as u8)
}

/// Trimmed email and password for a sign-in attempt.
pub fn validate_sign_in(email: &str, password: &str) -> Result<(String, String), ValidationError> {
    let email = email.trim();
    let password = password.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok((email.to_string(), password.to_string()))
}

/// Same as [`validate_sign_in`] plus the minimum password length.
pub fn validate_sign_up(email: &str, password: &str) -> Result<(String, String), ValidationError> {
    let (email, password) = validate_sign_in(email, password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    Ok((email, password))
}

pub fn validate_message(content: &str) -> Result<String, ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    Ok(content.to_string())
}

/// Title and video link of a performance, both required.
pub fn validate_performance(title: &str, video_link: &str) -> Result<(String, String), ValidationError> {
    Ok((required("title", title)?, required("video link", video_link)?))
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(value.to_string())
}
