//! Savings goals. A goal completes the first time its progress reaches its
//! amount and then awards its reward points exactly once.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{FinanceError, FinanceResult};
use super::FinanceService;
use crate::progress::{CompletableKey, CompletionReport};
use crate::store::LedgerStore;
use crate::validation::{self, ValidationError, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GoalType {
    Save,
    Invest,
    Payoff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub title: String,
    pub amount: f64,
    pub target_date: NaiveDate,
    pub progress: f64,
    /// Points awarded on completion, fixed when the goal is created
    pub reward_points: i64,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn award_source(&self) -> String {
        format!("Completed Goal: {}", self.title)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub title: String,
    pub amount: f64,
    pub target_date: NaiveDate,
}

impl NewGoal {
    pub fn validate(&self, today: NaiveDate) -> ValidationResult {
        validation::non_empty("title", &self.title)?;
        validation::positive("amount", self.amount)?;
        if self.target_date <= today {
            return Err(ValidationError::new("targetDate must be in the future"));
        }
        Ok(())
    }
}

/// Body of the goal and challenge progress routes
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressRequest {
    pub progress: f64,
}

impl ProgressRequest {
    pub fn validate(&self) -> ValidationResult {
        validation::non_negative("progress", self.progress)
    }
}

impl<S: LedgerStore> FinanceService<S> {
    pub fn create_goal(&self, user_id: Uuid, request: NewGoal) -> FinanceResult<Goal> {
        request.validate(Utc::now().date_naive())?;
        let now = Utc::now();

        let goal = Goal {
            id: Uuid::new_v4(),
            user_id,
            goal_type: request.goal_type,
            title: request.title.trim().to_string(),
            amount: request.amount,
            target_date: request.target_date,
            progress: 0.0,
            reward_points: self.rewards.goal_points,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_goal(&goal)?;
        Ok(goal)
    }

    /// Goals ordered by target date, soonest first
    pub fn list_goals(&self, user_id: Uuid) -> FinanceResult<Vec<Goal>> {
        let mut goals = self.store.list_goals(user_id)?;
        goals.sort_by(|a, b| a.target_date.cmp(&b.target_date));
        Ok(goals)
    }

    /// Store new progress; awards the goal points the first time it completes
    pub fn update_goal_progress(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        request: ProgressRequest,
    ) -> FinanceResult<(Goal, CompletionReport)> {
        request.validate()?;

        let key = CompletableKey::goal(user_id, goal_id);
        let report = self.engine.complete_and_award(key, request.progress)?;

        let goal = self
            .store
            .find_goal(user_id, goal_id)?
            .ok_or_else(|| FinanceError::NotFound("Goal".to_string()))?;
        Ok((goal, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::test_support::service_with_user;
    use crate::progress::CompletionOutcome;
    use chrono::Duration;

    fn new_goal(amount: f64) -> NewGoal {
        NewGoal {
            goal_type: GoalType::Save,
            title: "Emergency fund".to_string(),
            amount,
            target_date: Utc::now().date_naive() + Duration::days(90),
        }
    }

    #[test]
    fn test_goal_target_date_must_be_future() {
        let today = Utc::now().date_naive();
        let mut goal = new_goal(1000.0);
        goal.target_date = today;
        assert!(goal.validate(today).is_err());
    }

    #[test]
    fn test_goal_completion_awards_once() {
        let (service, user_id) = service_with_user();
        let goal = service.create_goal(user_id, new_goal(1000.0)).unwrap();

        let (_, report) = service
            .update_goal_progress(user_id, goal.id, ProgressRequest { progress: 400.0 })
            .unwrap();
        assert_eq!(report.outcome, CompletionOutcome::Unchanged);

        let (updated, report) = service
            .update_goal_progress(user_id, goal.id, ProgressRequest { progress: 1000.0 })
            .unwrap();
        assert_eq!(report.outcome, CompletionOutcome::JustCompleted(10));
        assert!(updated.completed_at.is_some());

        let (_, report) = service
            .update_goal_progress(user_id, goal.id, ProgressRequest { progress: 1000.0 })
            .unwrap();
        assert_eq!(report.outcome, CompletionOutcome::AlreadyCompleted);

        let history = service.engine().history(user_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].source, "Completed Goal: Emergency fund");
        assert_eq!(service.engine().summary(user_id).unwrap().xp, 10);
    }

    #[test]
    fn test_goal_progress_other_user_not_found() {
        let (service, user_id) = service_with_user();
        let goal = service.create_goal(user_id, new_goal(1000.0)).unwrap();

        let result = service.update_goal_progress(Uuid::new_v4(), goal.id, ProgressRequest { progress: 5.0 });
        assert!(matches!(
            result,
            Err(FinanceError::Progress(crate::progress::ProgressError::CompletableNotFound(_)))
        ));
    }

    #[test]
    fn test_goals_sorted_by_target_date() {
        let (service, user_id) = service_with_user();
        let mut later = new_goal(10.0);
        later.target_date = later.target_date + Duration::days(30);
        service.create_goal(user_id, later).unwrap();
        service.create_goal(user_id, new_goal(20.0)).unwrap();

        let goals = service.list_goals(user_id).unwrap();
        assert_eq!(goals[0].amount, 20.0);
    }
}
