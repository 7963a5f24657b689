//! # FinFlex Ledger Store
//!
//! Persistence boundary for accounts, ledger records and the award history.
//!
//! ## Atomicity
//! - `commit_award` increments XP, updates the level and appends the
//!   history event as one operation; XP is never fetched and rewritten
//! - `complete_with_award` writes progress, decides completion and commits
//!   the completion award as one operation
//! - `record_entry` stores an income or expense together with its award
//! - A failed operation leaves no trace, in memory or in the snapshot

mod memory;

pub use memory::InMemoryLedgerStore;

use thiserror::Error;
use uuid::Uuid;

use crate::auth::UserRepository;
use crate::finance::{
    Budget, Challenge, Expense, ExpenseFilter, Goal, Income, IncomeFilter, MembershipView,
    UserChallenge,
};
use crate::progress::{
    Account, AwardEvent, CommittedAward, CompletableKey, LevelUpdate, ProgressUpdate,
};
use crate::validation::Month;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    #[error("XP balance cannot go below zero (current {current}, delta {delta})")]
    NegativeBalance { current: i64, delta: i64 },

    #[error("XP total out of range (current {current}, delta {delta})")]
    XpOutOfRange { current: i64, delta: i64 },

    /// Lock poisoned or snapshot I/O failed
    #[error("Storage error: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NegativeBalance { .. } => 400,
            StoreError::XpOutOfRange { .. } => 400,
            StoreError::AccountNotFound(_) => 404,
            StoreError::NotFound(_) => 404,
            StoreError::Conflict(_) => 409,
            StoreError::Unavailable(_) => 500,
        }
    }
}

/// A ledger record that earns an award when stored
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEntry {
    Income(Income),
    Expense(Expense),
}

/// Ledger persistence
///
/// Implementations must make every mutation atomic with respect to the
/// others and to concurrent callers, including callers in other processes.
/// An operation that returns an error must not leave a partial write.
pub trait LedgerStore: UserRepository + Send + Sync {
    // ==================
    // Accounts & awards
    // ==================

    fn get_account(&self, id: Uuid) -> StoreResult<Account>;

    /// Add `event.points` to the account's XP, apply `level`, append `event`.
    ///
    /// Returns the account before and after. Rejects the award without any
    /// write if the new XP would be negative.
    fn commit_award(&self, event: &AwardEvent, level: LevelUpdate<'_>) -> StoreResult<(Account, Account)>;

    fn award_history(&self, user_id: Uuid) -> StoreResult<Vec<AwardEvent>>;

    /// Write new progress and return the completion decision made against
    /// the pre-update state. Never awards.
    fn update_completable_progress(&self, key: &CompletableKey, new_progress: f64) -> StoreResult<ProgressUpdate>;

    /// Like `update_completable_progress`, but on `JustCompleted` also
    /// commits the completion award. If the award is rejected the progress
    /// write is rolled back too, so a retry can still complete.
    fn complete_with_award(
        &self,
        key: &CompletableKey,
        new_progress: f64,
        level: LevelUpdate<'_>,
    ) -> StoreResult<(ProgressUpdate, Option<CommittedAward>)>;

    // ==================
    // Ledger records
    // ==================

    /// Store `entry` and commit `event` together; neither survives if the other fails
    fn record_entry(&self, entry: &LedgerEntry, event: &AwardEvent, level: LevelUpdate<'_>) -> StoreResult<CommittedAward>;

    fn list_incomes(&self, user_id: Uuid, filter: &IncomeFilter) -> StoreResult<Vec<Income>>;

    fn list_expenses(&self, user_id: Uuid, filter: &ExpenseFilter) -> StoreResult<Vec<Expense>>;

    /// Fails with `Conflict` if the (user, category, month) slot is taken
    fn insert_budget(&self, budget: &Budget) -> StoreResult<()>;

    fn list_budgets(&self, user_id: Uuid, month: Option<Month>) -> StoreResult<Vec<Budget>>;

    /// `None` if the budget does not exist or belongs to someone else
    fn set_budget_spent(&self, owner: Uuid, budget_id: Uuid, spent: f64) -> StoreResult<Option<Budget>>;

    fn insert_goal(&self, goal: &Goal) -> StoreResult<()>;

    fn list_goals(&self, user_id: Uuid) -> StoreResult<Vec<Goal>>;

    fn find_goal(&self, owner: Uuid, goal_id: Uuid) -> StoreResult<Option<Goal>>;

    // ==================
    // Challenges
    // ==================

    fn insert_challenge(&self, challenge: &Challenge) -> StoreResult<()>;

    fn list_challenges(&self) -> StoreResult<Vec<Challenge>>;

    /// Fails with `NotFound` for an unknown challenge, `Conflict` if already joined
    fn join_challenge(&self, membership: &UserChallenge) -> StoreResult<()>;

    fn find_membership(&self, user_id: Uuid, challenge_id: Uuid) -> StoreResult<Option<UserChallenge>>;

    fn list_memberships(&self, user_id: Uuid) -> StoreResult<Vec<MembershipView>>;
}
