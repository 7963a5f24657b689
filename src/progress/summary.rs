//! # Progress Projection
//!
//! Read-time view of an account's standing. Never persisted.

use serde::{Deserialize, Serialize};

use super::schedule::ThresholdSchedule;

/// How an account's level relates to its XP
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelPolicy {
    /// Level is recomputed from cumulative XP on every award
    #[default]
    Derived,

    /// Level is never advanced by awards; progress is measured on raw XP
    Legacy,
}

/// Summary returned by `GET /api/xp/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub xp: i64,
    pub level: u32,
    pub xp_for_next_level: u64,
    pub progress_percent: u8,
}

/// Project `(xp, level)` into a summary.
///
/// The schedule must already be validated, so the divisor is positive.
pub fn summarize(
    schedule: &ThresholdSchedule,
    policy: LevelPolicy,
    xp: i64,
    level: u32,
) -> ProgressSummary {
    let needed = schedule.xp_for_level(level);
    let earned = match policy {
        LevelPolicy::Derived => i128::from(xp) - i128::from(schedule.xp_floor(level)),
        LevelPolicy::Legacy => i128::from(xp),
    };

    ProgressSummary {
        xp,
        level,
        xp_for_next_level: needed,
        progress_percent: percent(earned, needed),
    }
}

/// `clamp(round(100 * earned / needed), 0, 100)`, rounding half up
fn percent(earned: i128, needed: u64) -> u8 {
    if earned <= 0 || needed == 0 {
        return 0;
    }
    let needed = i128::from(needed);
    let rounded = (200 * earned + needed) / (2 * needed);
    rounded.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> ThresholdSchedule {
        ThresholdSchedule::default()
    }

    #[test]
    fn test_fresh_account_summary() {
        let summary = summarize(&schedule(), LevelPolicy::Derived, 5, 0);
        assert_eq!(summary.xp_for_next_level, 100);
        assert_eq!(summary.progress_percent, 5);
    }

    #[test]
    fn test_derived_progress_within_level() {
        // Level 1 starts at 100 XP and needs 120 more.
        let summary = summarize(&schedule(), LevelPolicy::Derived, 160, 1);
        assert_eq!(summary.xp_for_next_level, 120);
        assert_eq!(summary.progress_percent, 50);
    }

    #[test]
    fn test_legacy_progress_uses_raw_xp() {
        let summary = summarize(&schedule(), LevelPolicy::Legacy, 160, 1);
        assert_eq!(summary.progress_percent, 100);

        let summary = summarize(&schedule(), LevelPolicy::Legacy, 60, 1);
        assert_eq!(summary.progress_percent, 50);
    }

    #[test]
    fn test_rounding_half_up() {
        // 1/200 = 0.5% rounds to 1, 1/201 rounds to 0
        assert_eq!(percent(1, 200), 1);
        assert_eq!(percent(1, 201), 0);
        assert_eq!(percent(199, 200), 100);
    }

    #[test]
    fn test_percent_always_in_range() {
        let schedules = [
            ThresholdSchedule::default(),
            ThresholdSchedule::new(1, 0),
            ThresholdSchedule::new(7, 3),
        ];
        let xps = [i64::MIN, -1, 0, 1, 99, 100, 5_000, i64::MAX];
        let levels = [0, 1, 2, 50, u32::MAX];

        for schedule in &schedules {
            for policy in [LevelPolicy::Derived, LevelPolicy::Legacy] {
                for &xp in &xps {
                    for &level in &levels {
                        let summary = summarize(schedule, policy, xp, level);
                        assert!(summary.progress_percent <= 100);
                    }
                }
            }
        }
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = summarize(&schedule(), LevelPolicy::Derived, 5, 0);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["xpForNextLevel"], 100);
        assert_eq!(json["progressPercent"], 5);
    }
}
