//! XP HTTP Routes: history, summary and admin grants

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use tracing::info;

use super::errors::ApiError;
use super::extract::{AdminUser, CurrentUser};
use super::state::AppState;
use crate::finance::{GrantRequest, GrantResponse};
use crate::progress::{AwardEvent, ProgressSummary};

pub fn xp_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/logs", get(xp_logs))
        .route("/me", get(xp_summary))
        .route("/grant", post(grant_xp))
        .with_state(state)
}

/// Award history, newest first
async fn xp_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AwardEvent>>, ApiError> {
    Ok(Json(state.finance.engine().history(user.id)?))
}

async fn xp_summary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProgressSummary>, ApiError> {
    Ok(Json(state.finance.engine().summary(user.id)?))
}

async fn grant_xp(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(request): Json<GrantRequest>,
) -> Result<Json<GrantResponse>, ApiError> {
    let response = state.finance.grant_xp(request)?;
    info!(
        admin_id = %admin.id,
        user_id = %response.event.user_id,
        points = response.event.points,
        "manual grant"
    );
    Ok(Json(response))
}
