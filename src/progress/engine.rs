//! # Progress Engine
//!
//! Sole writer of account XP and level. Award emitters (income, expense,
//! goal, challenge and admin grant flows) call into the engine instead of
//! touching account rows.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::award::{AwardEvent, CommittedAward, LevelUpdate};
use super::completion::{CompletableKey, CompletionOutcome};
use super::errors::ProgressResult;
use super::schedule::ThresholdSchedule;
use super::summary::{summarize, LevelPolicy, ProgressSummary};
use crate::store::{LedgerEntry, LedgerStore};

/// Outcome of `try_complete` with the label an award would carry
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub account: Uuid,
    pub outcome: CompletionOutcome,
    pub source: String,
}

/// Result of comparing an account's XP against its history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub xp: i64,
    pub history_total: i64,
    pub level: u32,
    pub expected_level: u32,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.xp == self.history_total && self.level == self.expected_level
    }
}

pub struct ProgressEngine<S: LedgerStore> {
    store: Arc<S>,
    schedule: ThresholdSchedule,
    policy: LevelPolicy,
}

impl<S: LedgerStore> ProgressEngine<S> {
    /// Create an engine; fails if the schedule can produce a zero threshold.
    pub fn new(store: Arc<S>, schedule: ThresholdSchedule, policy: LevelPolicy) -> ProgressResult<Self> {
        schedule.validate()?;
        Ok(Self {
            store,
            schedule,
            policy,
        })
    }

    pub fn schedule(&self) -> &ThresholdSchedule {
        &self.schedule
    }

    pub fn policy(&self) -> LevelPolicy {
        self.policy
    }

    fn level_update(&self) -> LevelUpdate<'_> {
        match self.policy {
            LevelPolicy::Derived => LevelUpdate::Recompute(&self.schedule),
            LevelPolicy::Legacy => LevelUpdate::Keep,
        }
    }

    /// Grant `points` to an account and append the event to its history.
    ///
    /// The increment, the history append and the level update happen in one
    /// store operation. Zero and negative grants are recorded like any other.
    pub fn award(&self, account_id: Uuid, points: i64, source: impl Into<String>) -> ProgressResult<AwardEvent> {
        let event = AwardEvent::new(account_id, points, source);
        let (before, after) = self.store.commit_award(&event, self.level_update())?;
        let committed = CommittedAward { event, before, after };
        log_award(&committed);
        Ok(committed.event)
    }

    /// Store a ledger entry together with its award.
    ///
    /// Either both are written or neither is, so a failed call can be retried
    /// without duplicating the entry.
    pub fn award_for_entry(&self, entry: &LedgerEntry, points: i64, source: impl Into<String>) -> ProgressResult<AwardEvent> {
        let account_id = match entry {
            LedgerEntry::Income(income) => income.user_id,
            LedgerEntry::Expense(expense) => expense.user_id,
        };
        let event = AwardEvent::new(account_id, points, source);
        let committed = self.store.record_entry(entry, &event, self.level_update())?;
        log_award(&committed);
        Ok(committed.event)
    }

    /// Store new progress for a completable and report whether it just completed.
    ///
    /// Does not award; the caller awards once on `JustCompleted`.
    pub fn try_complete(&self, key: CompletableKey, new_progress: f64) -> ProgressResult<CompletionReport> {
        let update = self.store.update_completable_progress(&key, new_progress)?;

        debug!(
            account = %key.account(),
            prior = update.prior_progress,
            new = new_progress,
            outcome = ?update.outcome,
            "progress updated"
        );

        Ok(CompletionReport {
            account: key.account(),
            outcome: update.outcome,
            source: update.source,
        })
    }

    /// Update progress and award the completion points when the target is crossed.
    ///
    /// The progress write and the award are one store operation. If the
    /// award is rejected the progress is not written either, so the
    /// completion can be retried.
    pub fn complete_and_award(&self, key: CompletableKey, new_progress: f64) -> ProgressResult<CompletionReport> {
        let (update, award) = self
            .store
            .complete_with_award(&key, new_progress, self.level_update())?;

        debug!(
            account = %key.account(),
            prior = update.prior_progress,
            new = new_progress,
            outcome = ?update.outcome,
            "progress updated"
        );
        if let Some(committed) = &award {
            info!(account = %key.account(), source = %update.source, "completed");
            log_award(committed);
        }

        Ok(CompletionReport {
            account: key.account(),
            outcome: update.outcome,
            source: update.source,
        })
    }

    /// Project an `(xp, level)` pair with this engine's schedule and policy
    pub fn summarize(&self, xp: i64, level: u32) -> ProgressSummary {
        summarize(&self.schedule, self.policy, xp, level)
    }

    /// Current summary for an account
    pub fn summary(&self, account_id: Uuid) -> ProgressResult<ProgressSummary> {
        let account = self.store.get_account(account_id)?;
        Ok(self.summarize(account.xp, account.level))
    }

    /// Award history, newest first
    pub fn history(&self, account_id: Uuid) -> ProgressResult<Vec<AwardEvent>> {
        self.store.get_account(account_id)?;
        let mut events = self.store.award_history(account_id)?;
        events.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(events)
    }

    /// Compare stored XP and level with what the history implies
    pub fn reconcile(&self, account_id: Uuid) -> ProgressResult<Reconciliation> {
        let account = self.store.get_account(account_id)?;
        let history_total = self
            .store
            .award_history(account_id)?
            .iter()
            .map(|e| e.points)
            .sum();
        let expected_level = match self.policy {
            LevelPolicy::Derived => self.schedule.level_for_xp(account.xp),
            LevelPolicy::Legacy => account.level,
        };

        Ok(Reconciliation {
            xp: account.xp,
            history_total,
            level: account.level,
            expected_level,
        })
    }
}

fn log_award(committed: &CommittedAward) {
    let CommittedAward { event, before, after } = committed;
    info!(
        user_id = %event.user_id,
        points = event.points,
        source = %event.source,
        xp = after.xp,
        "xp awarded"
    );
    if after.level != before.level {
        info!(
            user_id = %event.user_id,
            from = before.level,
            to = after.level,
            "level changed"
        );
    }
}
