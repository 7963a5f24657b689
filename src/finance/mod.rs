//! # FinFlex Finance Module
//!
//! Income, expense, budget, goal and challenge flows. These are the award
//! emitters: they decide when XP is granted and hand the grant to the
//! progress engine, which is the only writer of account XP.

pub mod budget;
pub mod challenge;
pub mod errors;
pub mod expense;
pub mod goal;
pub mod grant;
pub mod income;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::progress::ProgressEngine;
use crate::store::LedgerStore;
use crate::validation::{self, ValidationResult};

pub use budget::{Budget, BudgetQuery, NewBudget, SpentUpdate};
pub use challenge::{Challenge, ChallengeStatus, MembershipView, NewChallenge, UserChallenge};
pub use errors::{FinanceError, FinanceResult};
pub use expense::{Expense, ExpenseFilter, ExpenseQuery, NewExpense};
pub use goal::{Goal, GoalType, NewGoal, ProgressRequest};
pub use grant::{GrantRequest, GrantResponse};
pub use income::{Frequency, Income, IncomeFilter, NewIncome};

/// Largest XP value a single award may carry, in either direction
pub const MAX_AWARD_POINTS: i64 = 1_000_000;

/// XP granted by each ledger action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    #[serde(default = "default_income_points")]
    pub income_points: i64,

    #[serde(default = "default_expense_points")]
    pub expense_points: i64,

    #[serde(default = "default_goal_points")]
    pub goal_points: i64,
}

fn default_income_points() -> i64 {
    5
}

fn default_expense_points() -> i64 {
    5
}

fn default_goal_points() -> i64 {
    10
}

impl Rewards {
    pub fn validate(&self) -> ValidationResult {
        validation::points_within("rewards.income_points", self.income_points, MAX_AWARD_POINTS)?;
        validation::points_within("rewards.expense_points", self.expense_points, MAX_AWARD_POINTS)?;
        validation::points_within("rewards.goal_points", self.goal_points, MAX_AWARD_POINTS)
    }
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            income_points: default_income_points(),
            expense_points: default_expense_points(),
            goal_points: default_goal_points(),
        }
    }
}

pub struct FinanceService<S: LedgerStore> {
    store: Arc<S>,
    engine: Arc<ProgressEngine<S>>,
    rewards: Rewards,
}

impl<S: LedgerStore> FinanceService<S> {
    pub fn new(store: Arc<S>, engine: Arc<ProgressEngine<S>>, rewards: Rewards) -> Self {
        Self {
            store,
            engine,
            rewards,
        }
    }

    pub fn engine(&self) -> &ProgressEngine<S> {
        &self.engine
    }
}
