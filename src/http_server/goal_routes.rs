//! Goal HTTP Routes

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{patch, post},
    Router,
};
use uuid::Uuid;

use super::errors::ApiError;
use super::extract::CurrentUser;
use super::state::AppState;
use crate::finance::{Goal, NewGoal, ProgressRequest};

pub fn goal_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(create_goal).get(list_goals))
        .route("/:id/progress", patch(update_progress))
        .with_state(state)
}

async fn create_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NewGoal>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let goal = state.finance.create_goal(user.id, request)?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn list_goals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Goal>>, ApiError> {
    Ok(Json(state.finance.list_goals(user.id)?))
}

/// Other users' goals answer 404
async fn update_progress(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<ProgressRequest>,
) -> Result<Json<Goal>, ApiError> {
    let (goal, _) = state.finance.update_goal_progress(user.id, goal_id, request)?;
    Ok(Json(goal))
}
