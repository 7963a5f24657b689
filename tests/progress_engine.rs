//! Progress Engine Tests
//!
//! End-to-end checks of the XP engine through the library API:
//! - Awards, summaries and the award history stay consistent
//! - Completion awards exactly once, including under concurrency
//! - Corrective grants may lower XP but never below zero
//! - A failed store write leaves progress, XP and history untouched

use std::fs;
use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use uuid::Uuid;

use finflex::auth::{PasswordPolicy, RegisterRequest, Role, User, UserRepository};
use finflex::finance::{
    FinanceError, FinanceService, Frequency, GoalType, GrantRequest, NewGoal, NewIncome,
    ProgressRequest, Rewards,
};
use finflex::progress::{
    CompletableKey, CompletionOutcome, LevelPolicy, ProgressEngine, ProgressError,
    ThresholdSchedule,
};
use finflex::store::InMemoryLedgerStore;

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    finance: FinanceService<InMemoryLedgerStore>,
    engine: Arc<ProgressEngine<InMemoryLedgerStore>>,
    user_id: Uuid,
}

fn setup(policy: LevelPolicy) -> Fixture {
    setup_with_store(Arc::new(InMemoryLedgerStore::new()), policy)
}

fn setup_with_store(store: Arc<InMemoryLedgerStore>, policy: LevelPolicy) -> Fixture {
    let request = RegisterRequest {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password: "analytical".to_string(),
        age: Some(36),
    };
    let user = User::new(&request, Role::User, &PasswordPolicy::default()).unwrap();
    store.create(&user).unwrap();

    let engine = Arc::new(ProgressEngine::new(store.clone(), ThresholdSchedule::default(), policy).unwrap());
    Fixture {
        finance: FinanceService::new(store, engine.clone(), Rewards::default()),
        engine,
        user_id: user.id,
    }
}

fn new_goal(amount: f64) -> NewGoal {
    NewGoal {
        goal_type: GoalType::Save,
        title: "Emergency fund".to_string(),
        amount,
        target_date: Utc::now().date_naive() + Duration::days(90),
    }
}

// =============================================================================
// Scenarios
// =============================================================================

/// A fresh account logging one income reaches 5% of level 0.
#[test]
fn test_first_income_award() {
    let fx = setup(LevelPolicy::Derived);

    fx.finance
        .log_income(
            fx.user_id,
            NewIncome {
                source: "Salary".to_string(),
                amount: 2500.0,
                frequency: Frequency::Monthly,
                date: Utc::now().date_naive(),
            },
        )
        .unwrap();

    let summary = fx.engine.summary(fx.user_id).unwrap();
    assert_eq!(summary.xp, 5);
    assert_eq!(summary.level, 0);
    assert_eq!(summary.xp_for_next_level, 100);
    assert_eq!(summary.progress_percent, 5);

    let history = fx.engine.history(fx.user_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].source, "Income: Salary");
    assert_eq!(history[0].points, 5);
}

/// Completing a goal twice awards its points once.
#[test]
fn test_goal_completion_is_idempotent() {
    let fx = setup(LevelPolicy::Derived);
    let goal = fx.finance.create_goal(fx.user_id, new_goal(1000.0)).unwrap();

    let (_, first) = fx
        .finance
        .update_goal_progress(fx.user_id, goal.id, ProgressRequest { progress: 1000.0 })
        .unwrap();
    assert_eq!(first.outcome, CompletionOutcome::JustCompleted(10));

    let (goal, second) = fx
        .finance
        .update_goal_progress(fx.user_id, goal.id, ProgressRequest { progress: 1000.0 })
        .unwrap();
    assert_eq!(second.outcome, CompletionOutcome::AlreadyCompleted);
    assert!(goal.completed_at.is_some());

    let history = fx.engine.history(fx.user_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].source, "Completed Goal: Emergency fund");
    assert_eq!(fx.engine.summary(fx.user_id).unwrap().xp, 10);
}

/// Lowering progress after completion and crossing again never re-awards.
#[test]
fn test_goal_completion_never_reverts() {
    let fx = setup(LevelPolicy::Derived);
    let goal = fx.finance.create_goal(fx.user_id, new_goal(500.0)).unwrap();

    for progress in [600.0, 100.0, 500.0, 900.0] {
        fx.finance
            .update_goal_progress(fx.user_id, goal.id, ProgressRequest { progress })
            .unwrap();
    }

    assert_eq!(fx.engine.history(fx.user_id).unwrap().len(), 1);
    assert_eq!(fx.engine.summary(fx.user_id).unwrap().xp, 10);
}

/// Two threads crossing the threshold together produce one award.
#[test]
fn test_concurrent_completion_awards_once() {
    for _ in 0..20 {
        let fx = setup(LevelPolicy::Derived);
        let goal = fx.finance.create_goal(fx.user_id, new_goal(1000.0)).unwrap();
        let key = CompletableKey::goal(fx.user_id, goal.id);

        let outcomes: Vec<CompletionOutcome> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let engine = &fx.engine;
                    scope.spawn(move || engine.complete_and_award(key, 1000.0).unwrap().outcome)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let completed = outcomes.iter().filter(|o| matches!(o, CompletionOutcome::JustCompleted(_))).count();
        assert_eq!(completed, 1);
        assert_eq!(fx.engine.history(fx.user_id).unwrap().len(), 1);
        assert_eq!(fx.engine.summary(fx.user_id).unwrap().xp, 10);
    }
}

// =============================================================================
// Store Failures
// =============================================================================

/// A goal completion whose snapshot write fails is not half-applied.
#[test]
fn test_goal_completion_survives_failed_write() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    let store = Arc::new(InMemoryLedgerStore::open(data.join("ledger.json")).unwrap());
    let fx = setup_with_store(store, LevelPolicy::Derived);
    let goal = fx.finance.create_goal(fx.user_id, new_goal(1000.0)).unwrap();

    fs::remove_dir_all(&data).unwrap();
    let result = fx
        .finance
        .update_goal_progress(fx.user_id, goal.id, ProgressRequest { progress: 1000.0 });
    assert_eq!(result.unwrap_err().status_code(), 500);

    let stored = &fx.finance.list_goals(fx.user_id).unwrap()[0];
    assert_eq!(stored.progress, 0.0);
    assert!(stored.completed_at.is_none());
    assert!(fx.engine.history(fx.user_id).unwrap().is_empty());
    assert_eq!(fx.engine.summary(fx.user_id).unwrap().xp, 0);

    fs::create_dir(&data).unwrap();
    let (goal, report) = fx
        .finance
        .update_goal_progress(fx.user_id, goal.id, ProgressRequest { progress: 1000.0 })
        .unwrap();
    assert_eq!(report.outcome, CompletionOutcome::JustCompleted(10));
    assert!(goal.completed_at.is_some());
    assert_eq!(fx.engine.summary(fx.user_id).unwrap().xp, 10);
    assert!(fx.engine.reconcile(fx.user_id).unwrap().is_consistent());
}

/// An income whose award overflows is not stored, so retrying cannot duplicate it.
#[test]
fn test_income_with_overflowing_award_is_not_stored() {
    let fx = setup(LevelPolicy::Derived);
    fx.engine.award(fx.user_id, i64::MAX, "Seed").unwrap();

    let income = NewIncome {
        source: "Salary".to_string(),
        amount: 2500.0,
        frequency: Frequency::Monthly,
        date: Utc::now().date_naive(),
    };
    for _ in 0..3 {
        let result = fx.finance.log_income(fx.user_id, income.clone());
        assert!(matches!(
            result,
            Err(FinanceError::Progress(ProgressError::XpOutOfRange { .. }))
        ));
    }

    assert!(fx
        .finance
        .list_incomes(fx.user_id, &Default::default())
        .unwrap()
        .is_empty());
    assert_eq!(fx.engine.history(fx.user_id).unwrap().len(), 1);
}

/// A negative correction lowers XP and is recorded in the history.
#[test]
fn test_corrective_grant() {
    let fx = setup(LevelPolicy::Derived);
    fx.engine.award(fx.user_id, 30, "Bonus").unwrap();

    let response = fx
        .finance
        .grant_xp(GrantRequest {
            user_id: fx.user_id,
            points: -5,
            reason: Some("Correction".to_string()),
        })
        .unwrap();

    assert_eq!(response.event.points, -5);
    assert_eq!(fx.engine.summary(fx.user_id).unwrap().xp, 25);

    let history = fx.engine.history(fx.user_id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|e| e.source == "Correction" && e.points == -5));
}

/// A correction larger than the balance is refused without a trace.
#[test]
fn test_grant_below_zero_rejected() {
    let fx = setup(LevelPolicy::Derived);
    fx.engine.award(fx.user_id, 3, "Bonus").unwrap();

    let result = fx.finance.grant_xp(GrantRequest {
        user_id: fx.user_id,
        points: -10,
        reason: None,
    });
    assert!(matches!(
        result,
        Err(FinanceError::Progress(ProgressError::NegativeBalance { current: 3, delta: -10 }))
    ));
    assert_eq!(fx.engine.history(fx.user_id).unwrap().len(), 1);
    assert_eq!(fx.engine.summary(fx.user_id).unwrap().xp, 3);
}

// =============================================================================
// Invariants
// =============================================================================

/// XP equals the sum of the history and the level follows the schedule.
#[test]
fn test_reconciliation_after_mixed_awards() {
    let fx = setup(LevelPolicy::Derived);
    let schedule = ThresholdSchedule::default();

    for points in [40, 75, -15, 0, 120, 200, -60, 5] {
        fx.engine.award(fx.user_id, points, "Mixed").unwrap();

        let report = fx.engine.reconcile(fx.user_id).unwrap();
        assert!(report.is_consistent(), "{:?}", report);
        assert_eq!(report.level, schedule.level_for_xp(report.xp));
    }

    let summary = fx.engine.summary(fx.user_id).unwrap();
    assert_eq!(summary.xp, 365);
    // floor(2) = 220, floor(3) = 360
    assert_eq!(summary.level, 3);
    assert_eq!(summary.xp_for_next_level, 160);
    assert_eq!(summary.progress_percent, 3);
}

/// Under the legacy policy awards never move the level.
#[test]
fn test_legacy_policy_keeps_level() {
    let fx = setup(LevelPolicy::Legacy);
    fx.engine.award(fx.user_id, 250, "Bonus").unwrap();

    let summary = fx.engine.summary(fx.user_id).unwrap();
    assert_eq!(summary.level, 0);
    assert_eq!(summary.progress_percent, 100);
    assert!(fx.engine.reconcile(fx.user_id).unwrap().is_consistent());
}

/// Progress percent stays within [0, 100] for any account state.
#[test]
fn test_progress_percent_bounds() {
    for policy in [LevelPolicy::Derived, LevelPolicy::Legacy] {
        let fx = setup(policy);
        for level in [0u32, 1, 5, 50, u32::MAX] {
            for xp in [0i64, 1, 99, 100, 5_000, i64::MAX] {
                let summary = fx.engine.summarize(xp, level);
                assert!(summary.progress_percent <= 100);
                assert!(summary.xp_for_next_level > 0);
            }
        }
    }
}

/// Unknown accounts are reported, not created.
#[test]
fn test_unknown_account() {
    let fx = setup(LevelPolicy::Derived);
    let missing = Uuid::new_v4();

    assert!(matches!(fx.engine.award(missing, 5, "Bonus"), Err(ProgressError::AccountNotFound(_))));
    assert!(matches!(fx.engine.summary(missing), Err(ProgressError::AccountNotFound(_))));
    assert!(matches!(fx.engine.history(missing), Err(ProgressError::AccountNotFound(_))));
}
