//! Challenge HTTP Routes
//!
//! Listing is public; creation requires the admin role.

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use tracing::info;
use uuid::Uuid;

use super::errors::ApiError;
use super::extract::{AdminUser, CurrentUser};
use super::state::AppState;
use crate::finance::{Challenge, MembershipView, NewChallenge, ProgressRequest, UserChallenge};

pub fn challenge_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(create_challenge).get(list_challenges))
        .route("/join/:id", post(join_challenge))
        .route("/progress/:id", patch(update_progress))
        .route("/my", get(my_challenges))
        .with_state(state)
}

async fn create_challenge(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(request): Json<NewChallenge>,
) -> Result<(StatusCode, Json<Challenge>), ApiError> {
    let challenge = state.finance.create_challenge(request)?;
    info!(admin_id = %admin.id, challenge_id = %challenge.id, "challenge published");
    Ok((StatusCode::CREATED, Json(challenge)))
}

async fn list_challenges(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Challenge>>, ApiError> {
    Ok(Json(state.finance.list_challenges()?))
}

async fn join_challenge(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(challenge_id): Path<Uuid>,
) -> Result<(StatusCode, Json<UserChallenge>), ApiError> {
    let membership = state.finance.join_challenge(user.id, challenge_id)?;
    Ok((StatusCode::CREATED, Json(membership)))
}

async fn update_progress(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(challenge_id): Path<Uuid>,
    Json(request): Json<ProgressRequest>,
) -> Result<Json<UserChallenge>, ApiError> {
    let (membership, _) = state
        .finance
        .update_challenge_progress(user.id, challenge_id, request)?;
    Ok(Json(membership))
}

async fn my_challenges(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<MembershipView>>, ApiError> {
    Ok(Json(state.finance.my_challenges(user.id)?))
}
