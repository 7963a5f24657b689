//! Budget HTTP Routes

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use uuid::Uuid;

use super::errors::ApiError;
use super::extract::CurrentUser;
use super::state::AppState;
use crate::finance::{Budget, BudgetQuery, NewBudget, SpentUpdate};

pub fn budget_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(create_budget).get(list_budgets))
        .route("/filter", get(filter_budgets))
        .route("/:id/spent", patch(update_spent))
        .with_state(state)
}

async fn create_budget(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NewBudget>,
) -> Result<(StatusCode, Json<Budget>), ApiError> {
    let budget = state.finance.create_budget(user.id, request)?;
    Ok((StatusCode::CREATED, Json(budget)))
}

async fn list_budgets(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Budget>>, ApiError> {
    Ok(Json(state.finance.list_budgets(user.id, None)?))
}

/// `?month=YYYY-MM`, required
async fn filter_budgets(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<BudgetQuery>,
) -> Result<Json<Vec<Budget>>, ApiError> {
    let month = query.month()?;
    Ok(Json(state.finance.list_budgets(user.id, Some(month))?))
}

async fn update_spent(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(budget_id): Path<Uuid>,
    Json(update): Json<SpentUpdate>,
) -> Result<Json<Budget>, ApiError> {
    Ok(Json(state.finance.set_budget_spent(user.id, budget_id, update)?))
}
