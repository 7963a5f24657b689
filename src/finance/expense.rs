//! Expense logging. Each logged expense awards the configured expense points.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::errors::FinanceResult;
use super::FinanceService;
use crate::store::{LedgerEntry, LedgerStore};
use crate::validation::{self, Month, ValidationError, ValidationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub recurring: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub recurring: bool,
}

impl NewExpense {
    pub fn validate(&self) -> ValidationResult {
        validation::non_empty("category", &self.category)?;
        validation::positive("amount", self.amount)
    }
}

/// Raw `GET /api/expense/filter` query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseQuery {
    pub category: Option<String>,
    pub month: Option<String>,
}

impl ExpenseQuery {
    pub fn parse(&self) -> Result<ExpenseFilter, ValidationError> {
        let month = self.month.as_deref().map(str::parse::<Month>).transpose()?;
        Ok(ExpenseFilter {
            category: self.category.clone().filter(|c| !c.is_empty()),
            month,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category: Option<String>,
    pub month: Option<Month>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = &self.category {
            if &expense.category != category {
                return false;
            }
        }
        if let Some(month) = self.month {
            if !month.contains(expense.date) {
                return false;
            }
        }
        true
    }
}

impl<S: LedgerStore> FinanceService<S> {
    /// Record an expense and award the expense points
    pub fn log_expense(&self, user_id: Uuid, request: NewExpense) -> FinanceResult<Expense> {
        request.validate()?;

        let expense = Expense {
            id: Uuid::new_v4(),
            user_id,
            category: request.category.trim().to_string(),
            amount: request.amount,
            date: request.date,
            recurring: request.recurring,
            created_at: Utc::now(),
        };
        let source = format!("Expense: {}", expense.category);
        self.engine.award_for_entry(
            &LedgerEntry::Expense(expense.clone()),
            self.rewards.expense_points,
            source,
        )?;
        info!(user_id = %user_id, expense_id = %expense.id, "expense logged");

        Ok(expense)
    }

    /// Expenses newest first
    pub fn list_expenses(&self, user_id: Uuid, filter: &ExpenseFilter) -> FinanceResult<Vec<Expense>> {
        let mut expenses = self.store.list_expenses(user_id, filter)?;
        expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(expenses)
    }
}
