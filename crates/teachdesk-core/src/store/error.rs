use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Remote(#[from] ApiError),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Position code already exists: {0}")]
    DuplicatePositionCode(String),

    #[error("Invalid input: {0}")]
    InvalidDraft(String),
}

impl StoreError {
    /// The remote gateway could not be reached.
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, StoreError::Remote(e) if e.is_unavailable())
    }

    /// Duplicate email, whether caught locally or rejected by the server.
    pub fn is_duplicate_email(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateEmail(_) | StoreError::Remote(ApiError::DuplicateEmail(_))
        )
    }
}
