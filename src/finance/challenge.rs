//! Challenges: created by admins, joined by users, completed at 100% progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::errors::{FinanceError, FinanceResult};
use super::goal::ProgressRequest;
use super::{FinanceService, MAX_AWARD_POINTS};
use crate::progress::{CompletableKey, CompletionReport};
use crate::store::LedgerStore;
use crate::validation::{self, ValidationError, ValidationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Length in days
    pub duration: u32,
    pub criteria: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn award_source(&self) -> String {
        format!("Challenge: {}", self.title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChallengeStatus {
    Active,
    Completed,
}

/// A user's membership in a challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChallenge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub status: ChallengeStatus,
    pub progress: f64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Membership with its challenge embedded, for `GET /api/challenges/my`
#[derive(Debug, Clone, Serialize)]
pub struct MembershipView {
    #[serde(flatten)]
    pub membership: UserChallenge,
    pub challenge: Challenge,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub criteria: String,
    pub points: i64,
}

impl NewChallenge {
    pub fn validate(&self) -> ValidationResult {
        validation::non_empty("title", &self.title)?;
        validation::non_empty("description", &self.description)?;
        validation::non_empty("criteria", &self.criteria)?;
        if self.duration < 1 {
            return Err(ValidationError::new("duration must be at least 1"));
        }
        if self.points <= 0 {
            return Err(ValidationError::new("points must be positive"));
        }
        validation::points_within("points", self.points, MAX_AWARD_POINTS)
    }
}

impl<S: LedgerStore> FinanceService<S> {
    /// Admin-only at the transport layer
    pub fn create_challenge(&self, request: NewChallenge) -> FinanceResult<Challenge> {
        request.validate()?;

        let challenge = Challenge {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description,
            duration: request.duration,
            criteria: request.criteria,
            points: request.points,
            created_at: Utc::now(),
        };
        self.store.insert_challenge(&challenge)?;
        info!(challenge_id = %challenge.id, points = challenge.points, "challenge created");
        Ok(challenge)
    }

    /// All challenges, newest first
    pub fn list_challenges(&self) -> FinanceResult<Vec<Challenge>> {
        let mut challenges = self.store.list_challenges()?;
        challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(challenges)
    }

    pub fn join_challenge(&self, user_id: Uuid, challenge_id: Uuid) -> FinanceResult<UserChallenge> {
        let membership = UserChallenge {
            id: Uuid::new_v4(),
            user_id,
            challenge_id,
            status: ChallengeStatus::Active,
            progress: 0.0,
            started_at: Utc::now(),
            completed_at: None,
        };
        self.store.join_challenge(&membership)?;
        Ok(membership)
    }

    /// Store new progress; awards the challenge points the first time it reaches 100
    pub fn update_challenge_progress(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        request: ProgressRequest,
    ) -> FinanceResult<(UserChallenge, CompletionReport)> {
        request.validate()?;

        let key = CompletableKey::challenge(user_id, challenge_id);
        let report = self.engine.complete_and_award(key, request.progress)?;

        let membership = self
            .store
            .find_membership(user_id, challenge_id)?
            .ok_or_else(|| FinanceError::NotFound("Challenge membership".to_string()))?;
        Ok((membership, report))
    }

    /// The caller's memberships, most recently joined first
    pub fn my_challenges(&self, user_id: Uuid) -> FinanceResult<Vec<MembershipView>> {
        let mut memberships = self.store.list_memberships(user_id)?;
        memberships.sort_by(|a, b| b.membership.started_at.cmp(&a.membership.started_at));
        Ok(memberships)
    }
}
