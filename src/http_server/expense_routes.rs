//! Expense HTTP Routes

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
use crate::finance::{Expense, ExpenseFilter, ExpenseQuery, NewExpense};

pub fn expense_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(create_expense).get(list_expenses))
        .route("/filter", get(filter_expenses))
        .with_state(state)
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NewExpense>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = state.finance.log_expense(user.id, request)?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = state.finance.list_expenses(user.id, &ExpenseFilter::default())?;
    Ok(Json(expenses))
}

/// `?category=&month=YYYY-MM`
async fn filter_expenses(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let filter = query.parse()?;
    let expenses = state.finance.list_expenses(user.id, &filter)?;
    Ok(Json(expenses))
}
