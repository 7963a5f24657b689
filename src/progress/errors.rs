//! # Progress Errors

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Result type for progress engine operations
pub type ProgressResult<T> = Result<T, ProgressError>;

/// Progress engine errors
#[derive(Debug, Clone, Error)]
pub enum ProgressError {
    /// Unknown account id
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Unknown goal or challenge membership
    #[error("{0} not found")]
    CompletableNotFound(String),

    /// Award would take the balance below zero
    #[error("Award of {delta} XP would leave a negative balance (current {current})")]
    NegativeBalance { current: i64, delta: i64 },

    /// Award would overflow the XP total
    #[error("Award of {delta} XP is out of range (current {current})")]
    XpOutOfRange { current: i64, delta: i64 },

    /// Threshold schedule can yield a non-positive value
    #[error("Invalid progress configuration: {0}")]
    Configuration(String),

    /// Persistence failure, propagated without retry
    #[error("{0}")]
    Store(StoreError),
}

impl ProgressError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ProgressError::NegativeBalance { .. } => 400,
            ProgressError::XpOutOfRange { .. } => 400,
            ProgressError::AccountNotFound(_) => 404,
            ProgressError::CompletableNotFound(_) => 404,
            ProgressError::Configuration(_) => 500,
            ProgressError::Store(e) => e.status_code(),
        }
    }
}

impl From<StoreError> for ProgressError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(id) => ProgressError::AccountNotFound(id),
            StoreError::NotFound(what) => ProgressError::CompletableNotFound(what),
            StoreError::NegativeBalance { current, delta } => {
                ProgressError::NegativeBalance { current, delta }
            }
            StoreError::XpOutOfRange { current, delta } => ProgressError::XpOutOfRange { current, delta },
            other => ProgressError::Store(other),
        }
    }
}
