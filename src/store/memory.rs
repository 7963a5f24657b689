//! In-memory ledger store with optional write-through JSON snapshot.
//!
//! Every table sits behind one `RwLock`. A mutation runs on a staged copy
//! of the tables under the write guard. When a snapshot path is configured
//! the copy is written out (temp file + rename) first, and only then does it
//! replace the live tables. A failed mutation or write changes nothing.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{LedgerEntry, LedgerStore, StoreError, StoreResult};
use crate::auth::{AuthError, AuthResult, User, UserRepository};
use crate::finance::{
    Budget, Challenge, ChallengeStatus, Expense, ExpenseFilter, Goal, Income, IncomeFilter,
    MembershipView, UserChallenge,
};
use crate::progress::{
    Account, AwardEvent, CommittedAward, CompletableKey, CompletionOutcome, LevelUpdate,
    ProgressUpdate, CHALLENGE_TARGET,
};
use crate::validation::Month;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerTables {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    incomes: Vec<Income>,
    #[serde(default)]
    expenses: Vec<Expense>,
    #[serde(default)]
    budgets: Vec<Budget>,
    #[serde(default)]
    goals: Vec<Goal>,
    #[serde(default)]
    challenges: Vec<Challenge>,
    #[serde(default)]
    memberships: Vec<UserChallenge>,
    #[serde(default)]
    awards: Vec<AwardEvent>,
}

impl LedgerTables {
    fn account(&self, id: Uuid) -> StoreResult<Account> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(account_of)
            .ok_or(StoreError::AccountNotFound(id))
    }

    fn apply_award(&mut self, event: &AwardEvent, level: LevelUpdate<'_>) -> StoreResult<(Account, Account)> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == event.user_id)
            .ok_or(StoreError::AccountNotFound(event.user_id))?;
        let before = account_of(user);

        let new_xp = user.xp.checked_add(event.points).ok_or(StoreError::XpOutOfRange {
            current: user.xp,
            delta: event.points,
        })?;
        if new_xp < 0 {
            return Err(StoreError::NegativeBalance {
                current: user.xp,
                delta: event.points,
            });
        }

        user.xp = new_xp;
        user.level = level.apply(user.level, new_xp);
        user.updated_at = Utc::now();
        let after = account_of(user);

        self.awards.push(event.clone());
        Ok((before, after))
    }

    fn commit(&mut self, event: &AwardEvent, level: LevelUpdate<'_>) -> StoreResult<CommittedAward> {
        let (before, after) = self.apply_award(event, level)?;
        Ok(CommittedAward {
            event: event.clone(),
            before,
            after,
        })
    }

    fn update_progress(&mut self, key: &CompletableKey, new_progress: f64) -> StoreResult<ProgressUpdate> {
        match *key {
            CompletableKey::Goal { owner, goal_id } => self.update_goal(owner, goal_id, new_progress),
            CompletableKey::Challenge {
                user_id,
                challenge_id,
            } => self.update_membership(user_id, challenge_id, new_progress),
        }
    }

    fn update_goal(&mut self, owner: Uuid, goal_id: Uuid, new_progress: f64) -> StoreResult<ProgressUpdate> {
        let goal = self
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id && g.user_id == owner)
            .ok_or_else(|| StoreError::NotFound("Goal".to_string()))?;

        let prior_progress = goal.progress;
        let outcome = CompletionOutcome::evaluate(
            goal.completed_at.is_some(),
            prior_progress,
            new_progress,
            goal.amount,
            goal.reward_points,
        );

        let now = Utc::now();
        goal.progress = new_progress;
        goal.updated_at = now;
        if let CompletionOutcome::JustCompleted(_) = outcome {
            goal.completed_at = Some(now);
        }

        Ok(ProgressUpdate {
            prior_progress,
            outcome,
            source: goal.award_source(),
        })
    }

    fn update_membership(&mut self, user_id: Uuid, challenge_id: Uuid, new_progress: f64) -> StoreResult<ProgressUpdate> {
        let (points, source) = self
            .challenges
            .iter()
            .find(|c| c.id == challenge_id)
            .map(|c| (c.points, c.award_source()))
            .ok_or_else(|| StoreError::NotFound("Challenge".to_string()))?;

        let membership = self
            .memberships
            .iter_mut()
            .find(|m| m.user_id == user_id && m.challenge_id == challenge_id)
            .ok_or_else(|| StoreError::NotFound("Challenge membership".to_string()))?;

        let prior_progress = membership.progress;
        let was_completed =
            membership.completed_at.is_some() || membership.status == ChallengeStatus::Completed;
        let outcome = CompletionOutcome::evaluate(
            was_completed,
            prior_progress,
            new_progress,
            CHALLENGE_TARGET,
            points,
        );

        membership.progress = new_progress;
        if let CompletionOutcome::JustCompleted(_) = outcome {
            membership.status = ChallengeStatus::Completed;
            membership.completed_at = Some(Utc::now());
        }

        Ok(ProgressUpdate {
            prior_progress,
            outcome,
            source,
        })
    }
}

fn account_of(user: &User) -> Account {
    Account {
        id: user.id,
        xp: user.xp,
        level: user.level,
    }
}

/// In-memory ledger store
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<LedgerTables>,
    snapshot: Option<PathBuf>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by a JSON snapshot, loading it if present.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let bytes = fs::read(&path).map_err(|e| {
                StoreError::Unavailable(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let tables: LedgerTables = serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Unavailable(format!("Corrupt snapshot {}: {}", path.display(), e))
            })?;
            info!(
                path = %path.display(),
                users = tables.users.len(),
                awards = tables.awards.len(),
                "ledger snapshot loaded"
            );
            tables
        } else {
            info!(path = %path.display(), "starting with an empty ledger");
            LedgerTables::default()
        };

        Ok(Self {
            tables: RwLock::new(tables),
            snapshot: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, LedgerTables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("Lock poisoned".to_string()))
    }

    /// Run a mutation on a staged copy under the write lock. The copy is
    /// persisted, then swapped in; on any error the live tables are untouched.
    fn write<T>(&self, mutate: impl FnOnce(&mut LedgerTables) -> StoreResult<T>) -> StoreResult<T> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("Lock poisoned".to_string()))?;

        let mut staged = tables.clone();
        let result = mutate(&mut staged)?;
        if let Some(path) = &self.snapshot {
            persist(path, &staged)?;
        }
        *tables = staged;
        Ok(result)
    }
}

fn persist(path: &Path, tables: &LedgerTables) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(tables)
        .map_err(|e| StoreError::Unavailable(format!("Failed to encode snapshot: {}", e)))?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|e| StoreError::Unavailable(format!("Failed to write {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), "ledger snapshot written");
    Ok(())
}

fn auth_storage_error(err: StoreError) -> AuthError {
    AuthError::StorageError(err.to_string())
}

impl UserRepository for InMemoryLedgerStore {
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        let tables = self.read().map_err(auth_storage_error)?;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let tables = self.read().map_err(auth_storage_error)?;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    fn email_exists(&self, email: &str) -> AuthResult<bool> {
        let tables = self.read().map_err(auth_storage_error)?;
        Ok(tables.users.iter().any(|u| u.email == email))
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        self.write(|tables| {
            if tables.users.iter().any(|u| u.email == user.email) {
                return Err(StoreError::Conflict("Email already exists".to_string()));
            }
            tables.users.push(user.clone());
            Ok(())
        })
        .map_err(|e| match e {
            StoreError::Conflict(_) => AuthError::EmailAlreadyExists,
            other => auth_storage_error(other),
        })
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn get_account(&self, id: Uuid) -> StoreResult<Account> {
        self.read()?.account(id)
    }

    fn commit_award(&self, event: &AwardEvent, level: LevelUpdate<'_>) -> StoreResult<(Account, Account)> {
        self.write(|tables| tables.apply_award(event, level))
    }

    fn award_history(&self, user_id: Uuid) -> StoreResult<Vec<AwardEvent>> {
        let tables = self.read()?;
        Ok(tables
            .awards
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    fn update_completable_progress(&self, key: &CompletableKey, new_progress: f64) -> StoreResult<ProgressUpdate> {
        self.write(|tables| tables.update_progress(key, new_progress))
    }

    fn complete_with_award(
        &self,
        key: &CompletableKey,
        new_progress: f64,
        level: LevelUpdate<'_>,
    ) -> StoreResult<(ProgressUpdate, Option<CommittedAward>)> {
        self.write(|tables| {
            let update = tables.update_progress(key, new_progress)?;
            let award = match update.outcome {
                CompletionOutcome::JustCompleted(points) => {
                    let event = AwardEvent::new(key.account(), points, update.source.clone());
                    Some(tables.commit(&event, level)?)
                }
                _ => None,
            };
            Ok((update, award))
        })
    }

    fn record_entry(&self, entry: &LedgerEntry, event: &AwardEvent, level: LevelUpdate<'_>) -> StoreResult<CommittedAward> {
        self.write(|tables| {
            match entry {
                LedgerEntry::Income(income) => tables.incomes.push(income.clone()),
                LedgerEntry::Expense(expense) => tables.expenses.push(expense.clone()),
            }
            tables.commit(event, level)
        })
    }

    fn list_incomes(&self, user_id: Uuid, filter: &IncomeFilter) -> StoreResult<Vec<Income>> {
        let tables = self.read()?;
        Ok(tables
            .incomes
            .iter()
            .filter(|i| i.user_id == user_id && filter.matches(i))
            .cloned()
            .collect())
    }

    fn list_expenses(&self, user_id: Uuid, filter: &ExpenseFilter) -> StoreResult<Vec<Expense>> {
        let tables = self.read()?;
        Ok(tables
            .expenses
            .iter()
            .filter(|e| e.user_id == user_id && filter.matches(e))
            .cloned()
            .collect())
    }

    fn insert_budget(&self, budget: &Budget) -> StoreResult<()> {
        self.write(|tables| {
            if tables.budgets.iter().any(|b| b.same_slot(budget)) {
                return Err(StoreError::Conflict(
                    "Budget for this category/month already exists".to_string(),
                ));
            }
            tables.budgets.push(budget.clone());
            Ok(())
        })
    }

    fn list_budgets(&self, user_id: Uuid, month: Option<Month>) -> StoreResult<Vec<Budget>> {
        let tables = self.read()?;
        Ok(tables
            .budgets
            .iter()
            .filter(|b| b.user_id == user_id && month.map_or(true, |m| b.month == m))
            .cloned()
            .collect())
    }

    fn set_budget_spent(&self, owner: Uuid, budget_id: Uuid, spent: f64) -> StoreResult<Option<Budget>> {
        self.write(|tables| {
            Ok(tables
                .budgets
                .iter_mut()
                .find(|b| b.id == budget_id && b.user_id == owner)
                .map(|budget| {
                    budget.spent = spent;
                    budget.updated_at = Utc::now();
                    budget.clone()
                }))
        })
    }

    fn insert_goal(&self, goal: &Goal) -> StoreResult<()> {
        self.write(|tables| {
            tables.goals.push(goal.clone());
            Ok(())
        })
    }

    fn list_goals(&self, user_id: Uuid) -> StoreResult<Vec<Goal>> {
        let tables = self.read()?;
        Ok(tables
            .goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    fn find_goal(&self, owner: Uuid, goal_id: Uuid) -> StoreResult<Option<Goal>> {
        let tables = self.read()?;
        Ok(tables
            .goals
            .iter()
            .find(|g| g.id == goal_id && g.user_id == owner)
            .cloned())
    }

    fn insert_challenge(&self, challenge: &Challenge) -> StoreResult<()> {
        self.write(|tables| {
            tables.challenges.push(challenge.clone());
            Ok(())
        })
    }

    fn list_challenges(&self) -> StoreResult<Vec<Challenge>> {
        Ok(self.read()?.challenges.clone())
    }

    fn join_challenge(&self, membership: &UserChallenge) -> StoreResult<()> {
        self.write(|tables| {
            if !tables.challenges.iter().any(|c| c.id == membership.challenge_id) {
                return Err(StoreError::NotFound("Challenge".to_string()));
            }
            if tables
                .memberships
                .iter()
                .any(|m| m.user_id == membership.user_id && m.challenge_id == membership.challenge_id)
            {
                return Err(StoreError::Conflict("Already joined this challenge".to_string()));
            }
            tables.memberships.push(membership.clone());
            Ok(())
        })
    }

    fn find_membership(&self, user_id: Uuid, challenge_id: Uuid) -> StoreResult<Option<UserChallenge>> {
        let tables = self.read()?;
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.user_id == user_id && m.challenge_id == challenge_id)
            .cloned())
    }

    fn list_memberships(&self, user_id: Uuid) -> StoreResult<Vec<MembershipView>> {
        let tables = self.read()?;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                tables
                    .challenges
                    .iter()
                    .find(|c| c.id == m.challenge_id)
                    .map(|c| MembershipView {
                        membership: m.clone(),
                        challenge: c.clone(),
                    })
            })
            .collect())
    }
}
