//! Auth HTTP Routes
//!
//! Registration, login, logout and the current profile, backed by `AuthService`.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Serialize;

use super::errors::ApiError;
use super::extract::CurrentUser;
use super::state::AppState;
use crate::auth::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, UserResponse};

/// Auth routes with shared state
pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/me", get(me_handler))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (user, token) = state.auth.register(request)?;
    let response = AuthResponse {
        user: UserResponse::from(&user),
        token,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (user, token) = state.auth.login(request)?;
    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        token,
    }))
}

/// Tokens are stateless; the client discards its copy
async fn logout_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

async fn me_handler(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(&user))
}
