use musicschool_backend::{AuthError, BackendError};
use musicschool_shared::error::ValidationError;
use musicschool_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Unknown study group: {0}")]
    UnknownGroup(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
