//! HTTP error mapping
//!
//! Every handler error becomes `{"error": <message>, "code": <status>}`.
//! Client errors are logged at `warn`, server errors at `error`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::finance::FinanceError;
use crate::progress::ProgressError;
use crate::validation::ValidationError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Finance(#[from] FinanceError),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Finance(FinanceError::Validation(err))
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Auth(e) => e.status_code(),
            ApiError::Finance(e) => e.status_code(),
            ApiError::Progress(e) => e.status_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(status = code, error = %self, "request failed");
        } else {
            warn!(status = code, error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(AuthError::Forbidden).status_code(), 403);
        assert_eq!(
            ApiError::from(FinanceError::Conflict("Already joined this challenge".to_string())).status_code(),
            409
        );
        assert_eq!(ApiError::from(ValidationError::new("bad month")).status_code(), 400);
    }

    #[test]
    fn test_error_body() {
        let response = ApiError::from(AuthError::InvalidCredentials).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
