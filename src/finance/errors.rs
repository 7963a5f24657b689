//! # Finance Errors

use thiserror::Error;

use crate::progress::ProgressError;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Result type for ledger feature operations
pub type FinanceResult<T> = Result<T, FinanceError>;

#[derive(Debug, Clone, Error)]
pub enum FinanceError {
    /// Payload or query rejected before reaching the store
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate budget or challenge membership
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Progress(#[from] ProgressError),

    #[error("{0}")]
    Store(StoreError),
}

impl FinanceError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            FinanceError::Validation(_) => 400,
            FinanceError::NotFound(_) => 404,
            FinanceError::Conflict(_) => 409,
            FinanceError::Progress(e) => e.status_code(),
            FinanceError::Store(e) => e.status_code(),
        }
    }
}

impl From<StoreError> for FinanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => FinanceError::NotFound(what),
            StoreError::Conflict(msg) => FinanceError::Conflict(msg),
            other => FinanceError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            FinanceError::from(ValidationError::new("amount must be a positive number")).status_code(),
            400
        );
        assert_eq!(
            FinanceError::from(StoreError::NotFound("Goal".to_string())).status_code(),
            404
        );
        assert_eq!(
            FinanceError::from(StoreError::Conflict("dup".to_string())).status_code(),
            409
        );
        assert_eq!(
            FinanceError::from(StoreError::Unavailable("io".to_string())).status_code(),
            500
        );
    }
}
