//! # Awards
//!
//! `AwardEvent` is the append-only XP history (the XP log). An account's XP
//! must always equal the sum of its events' points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schedule::ThresholdSchedule;

/// XP and level of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub xp: i64,
    pub level: u32,
}

/// One XP grant, positive or corrective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source: String,
    pub points: i64,
    pub date: DateTime<Utc>,
}

impl AwardEvent {
    pub fn new(user_id: Uuid, points: i64, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            source: source.into(),
            points,
            date: Utc::now(),
        }
    }
}

/// An award as committed by the store, with the account on either side of it
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedAward {
    pub event: AwardEvent,
    pub before: Account,
    pub after: Account,
}

/// What the store does with the level when committing an award
#[derive(Debug, Clone, Copy)]
pub enum LevelUpdate<'a> {
    /// Recompute from the new XP total
    Recompute(&'a ThresholdSchedule),
    /// Leave the stored level untouched
    Keep,
}

impl LevelUpdate<'_> {
    pub fn apply(&self, current_level: u32, new_xp: i64) -> u32 {
        match self {
            LevelUpdate::Recompute(schedule) => schedule.level_for_xp(new_xp),
            LevelUpdate::Keep => current_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_event_serialization() {
        let event = AwardEvent::new(Uuid::new_v4(), 5, "Income: Salary");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["points"], 5);
        assert_eq!(json["source"], "Income: Salary");
        assert!(json.get("userId").is_some());
        assert!(json.get("date").is_some());
    }

    #[test]
    fn test_level_update() {
        let schedule = ThresholdSchedule::default();
        assert_eq!(LevelUpdate::Recompute(&schedule).apply(0, 230), 2);
        assert_eq!(LevelUpdate::Recompute(&schedule).apply(3, 50), 0);
        assert_eq!(LevelUpdate::Keep.apply(3, 50), 3);
    }
}
