//! Manual XP grants. The admin capability is checked by the transport layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::FinanceResult;
use super::{FinanceService, MAX_AWARD_POINTS};
use crate::progress::AwardEvent;
use crate::store::LedgerStore;
use crate::validation::{self, ValidationResult};

pub const DEFAULT_GRANT_REASON: &str = "Manual grant";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub user_id: Uuid,
    /// May be zero or negative for corrections
    pub points: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

impl GrantRequest {
    pub fn validate(&self) -> ValidationResult {
        validation::points_within("points", self.points, MAX_AWARD_POINTS)
    }

    pub fn source(&self) -> String {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_GRANT_REASON)
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GrantResponse {
    pub message: String,
    pub event: AwardEvent,
}

impl<S: LedgerStore> FinanceService<S> {
    pub fn grant_xp(&self, request: GrantRequest) -> FinanceResult<GrantResponse> {
        request.validate()?;
        let event = self
            .engine
            .award(request.user_id, request.points, request.source())?;

        Ok(GrantResponse {
            message: format!("Granted {} XP to user {}", event.points, event.user_id),
            event,
        })
    }
}
