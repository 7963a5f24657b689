//! Monthly budgets, unique per (user, category, month).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{FinanceError, FinanceResult};
use super::FinanceService;
use crate::store::LedgerStore;
use crate::validation::{self, Month, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub limit: f64,
    pub month: Month,
    pub spent: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn same_slot(&self, other: &Budget) -> bool {
        self.user_id == other.user_id && self.category == other.category && self.month == other.month
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBudget {
    pub category: String,
    pub limit: f64,
    pub month: String,
}

impl NewBudget {
    /// Returns the parsed month on success
    pub fn validate(&self) -> Result<Month, ValidationError> {
        validation::non_empty("category", &self.category)?;
        validation::positive("limit", self.limit)?;
        self.month.parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpentUpdate {
    pub spent: f64,
}

/// `GET /api/budget/filter` query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetQuery {
    pub month: Option<String>,
}

impl BudgetQuery {
    pub fn month(&self) -> Result<Month, ValidationError> {
        match self.month.as_deref() {
            Some(month) if !month.is_empty() => month.parse(),
            _ => Err(ValidationError::new("Month query param required")),
        }
    }
}

impl<S: LedgerStore> FinanceService<S> {
    pub fn create_budget(&self, user_id: Uuid, request: NewBudget) -> FinanceResult<Budget> {
        let month = request.validate()?;
        let now = Utc::now();

        let budget = Budget {
            id: Uuid::new_v4(),
            user_id,
            category: request.category.trim().to_string(),
            limit: request.limit,
            month,
            spent: 0.0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_budget(&budget)?;
        Ok(budget)
    }

    /// Budgets, latest month first
    pub fn list_budgets(&self, user_id: Uuid, month: Option<Month>) -> FinanceResult<Vec<Budget>> {
        let mut budgets = self.store.list_budgets(user_id, month)?;
        budgets.sort_by(|a, b| b.month.cmp(&a.month).then(a.category.cmp(&b.category)));
        Ok(budgets)
    }

    /// Overwrite the spent amount of one of the caller's budgets
    pub fn set_budget_spent(&self, user_id: Uuid, budget_id: Uuid, update: SpentUpdate) -> FinanceResult<Budget> {
        validation::non_negative("spent", update.spent)?;
        self.store
            .set_budget_spent(user_id, budget_id, update.spent)?
            .ok_or_else(|| FinanceError::NotFound("Budget".to_string()))
    }
}
