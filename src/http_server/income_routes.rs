//! Income HTTP Routes

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};

use super::errors::ApiError;
use super::extract::CurrentUser;
use super::state::AppState;
use crate::finance::{Income, IncomeFilter, NewIncome};

pub fn income_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(create_income).get(list_incomes))
        .route("/filter", get(filter_incomes))
        .with_state(state)
}

async fn create_income(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NewIncome>,
) -> Result<(StatusCode, Json<Income>), ApiError> {
    let income = state.finance.log_income(user.id, request)?;
    Ok((StatusCode::CREATED, Json(income)))
}

async fn list_incomes(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Income>>, ApiError> {
    let incomes = state.finance.list_incomes(user.id, &IncomeFilter::default())?;
    Ok(Json(incomes))
}

async fn filter_incomes(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<IncomeFilter>,
) -> Result<Json<Vec<Income>>, ApiError> {
    let incomes = state.finance.list_incomes(user.id, &filter)?;
    Ok(Json(incomes))
}
