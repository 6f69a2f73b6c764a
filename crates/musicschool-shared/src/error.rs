use thiserror::Error;

/// Input rejected before any store or provider call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields ({0} is empty)")]
    EmptyField(&'static str),

    #[error("Age must be a whole number")]
    AgeNotANumber,

    #[error("Age must be between {min} and {max} years (got {age})")]
    AgeOutOfRange { age: i64, min: u8, max: u8 },

    #[error("Fill in the email and the password")]
    MissingCredentials,

    #[error("The password must have at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Message content is empty")]
    EmptyMessage,
}
